//! Running-template adaptation.

use crate::image::{ImageView, OwnedImage};
use crate::template::Template;
use crate::util::{TrackError, TrackResult};

/// Blends a matched patch into the running template.
///
/// Each pixel becomes `(old * (255 - alpha) + matched * alpha + 127) / 255`.
/// `alpha == 0` keeps the template unchanged and `alpha == 255` replaces it
/// with the matched patch. The mask is carried over.
pub fn evolve(template: &Template, matched: ImageView<'_, u8>, alpha: u8) -> TrackResult<Template> {
    let (width, height) = (template.width(), template.height());
    if matched.width() != width || matched.height() != height {
        return Err(TrackError::ShapeMismatch {
            expected_width: width,
            expected_height: height,
            width: matched.width(),
            height: matched.height(),
        });
    }
    if alpha == 0 {
        return Ok(template.clone());
    }

    let a = u32::from(alpha);
    let keep = 255 - a;
    let old = template.view();
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        let (Some(old_row), Some(new_row)) = (old.row(y), matched.row(y)) else {
            return Err(TrackError::BufferTooSmall {
                needed: (y + 1) * matched.stride(),
                got: matched.as_slice().len(),
            });
        };
        data.extend(
            old_row
                .iter()
                .zip(new_row)
                .map(|(&o, &m)| ((u32::from(o) * keep + u32::from(m) * a + 127) / 255) as u8),
        );
    }
    template.with_pixels(OwnedImage::new(data, width, height)?)
}

#[cfg(test)]
mod tests {
    use super::evolve;
    use crate::image::OwnedImage;
    use crate::template::Template;
    use crate::util::TrackError;

    fn tpl(data: Vec<u8>) -> Template {
        Template::new(data, 3, 2).unwrap()
    }

    #[test]
    fn alpha_zero_is_identity() {
        let t = tpl(vec![0, 50, 100, 150, 200, 255]);
        let patch = OwnedImage::new(vec![255, 0, 7, 9, 1, 3], 3, 2).unwrap();
        let mut cur = t.clone();
        for _ in 0..5 {
            cur = evolve(&cur, patch.view(), 0).unwrap();
        }
        assert_eq!(cur.pixels(), t.pixels());
    }

    #[test]
    fn alpha_full_copies_patch() {
        let t = tpl(vec![0, 50, 100, 150, 200, 255]);
        let patch = OwnedImage::new(vec![255, 0, 7, 9, 1, 3], 3, 2).unwrap();
        let out = evolve(&t, patch.view(), 255).unwrap();
        assert_eq!(out.pixels(), patch.data());
        assert_eq!(out.mask(), t.mask());
    }

    #[test]
    fn half_alpha_rounds_to_nearest() {
        let t = tpl(vec![0, 0, 100, 255, 10, 200]);
        let patch = OwnedImage::new(vec![255, 1, 100, 0, 20, 100], 3, 2).unwrap();
        let out = evolve(&t, patch.view(), 128).unwrap();
        // (0*127 + 255*128 + 127) / 255 = 128
        assert_eq!(out.pixels()[0], 128);
        assert_eq!(out.pixels()[2], 100);
        assert_eq!(out.pixels()[3], 127);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let t = tpl(vec![1; 6]);
        let patch = OwnedImage::new(vec![1; 4], 2, 2).unwrap();
        assert!(matches!(
            evolve(&t, patch.view(), 10),
            Err(TrackError::ShapeMismatch { .. })
        ));
    }
}
