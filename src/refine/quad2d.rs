//! Separable quadratic refinement of a 2D correlation peak.

use crate::refine::quad1d::quad_peak_offset_1d;

/// Refines an integer peak using separable 1D quadratic fits.
///
/// `s` is the 3x3 score neighbourhood centered at `s[1][1]`, indexed
/// `s[row][col]`. `dx` comes from the center row and `dy` from the center
/// column; an ill-conditioned axis falls back to the integer position.
pub fn refine_subpixel_2d(center_x: usize, center_y: usize, s: [[f32; 3]; 3]) -> (f32, f32) {
    let dx = quad_peak_offset_1d(s[1][0], s[1][1], s[1][2]).unwrap_or(0.0);
    let dy = quad_peak_offset_1d(s[0][1], s[1][1], s[2][1]).unwrap_or(0.0);

    (center_x as f32 + dx, center_y as f32 + dy)
}

#[cfg(test)]
mod tests {
    use super::refine_subpixel_2d;

    #[test]
    fn paraboloid_peak_is_recovered() {
        let coords = [-1.0f32, 0.0, 1.0];
        let mut s = [[0.0f32; 3]; 3];
        for (yi, &y) in coords.iter().enumerate() {
            for (xi, &x) in coords.iter().enumerate() {
                s[yi][xi] = 1.0 - (x - 0.3).powi(2) - (y + 0.2).powi(2);
            }
        }

        let (x, y) = refine_subpixel_2d(10, 20, s);
        assert!((x - 10.3).abs() < 1e-3);
        assert!((y - 19.8).abs() < 1e-3);
    }

    #[test]
    fn border_peak_keeps_integer_axis() {
        let mut s = [[f32::NEG_INFINITY; 3]; 3];
        s[1] = [0.5, 1.0, 0.5];
        s[2][1] = 0.4;
        let (x, y) = refine_subpixel_2d(0, 0, s);
        assert!(x.abs() < 1e-6);
        assert_eq!(y, 0.0);
    }
}
