//! Numeric helpers for line geometry and score scaling.

/// Computes sine and cosine for an angle in degrees.
pub(crate) fn sin_cos_deg(angle_deg: f32) -> (f32, f32) {
    angle_deg.to_radians().sin_cos()
}

/// Unit direction vector `(dx, dy)` for an angle in degrees.
///
/// Angles follow image conventions: 0 points along +x and 90 along +y (down).
pub(crate) fn direction_deg(angle_deg: f32) -> (f32, f32) {
    let (sin, cos) = sin_cos_deg(angle_deg);
    (cos, sin)
}

/// Rounds to the nearest integer and converts to `isize`.
pub(crate) fn round_isize(value: f32) -> isize {
    value.round() as isize
}

/// Least-squares slope and intercept of `y` against `x`.
///
/// Returns `None` when fewer than two samples are given or all `x` are equal.
pub(crate) fn linear_fit(samples: &[(f32, f32)]) -> Option<(f32, f32)> {
    if samples.len() < 2 {
        return None;
    }
    let n = samples.len() as f64;
    let mean_x = samples.iter().map(|s| s.0 as f64).sum::<f64>() / n;
    let mean_y = samples.iter().map(|s| s.1 as f64).sum::<f64>() / n;
    let mut sxx = 0.0f64;
    let mut sxy = 0.0f64;
    for &(x, y) in samples {
        let dx = x as f64 - mean_x;
        sxx += dx * dx;
        sxy += dx * (y as f64 - mean_y);
    }
    if sxx <= 1e-12 {
        return None;
    }
    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    Some((slope as f32, intercept as f32))
}
