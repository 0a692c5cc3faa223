//! Masked templates and their correlation plans.

use crate::geometry::Point;
use crate::image::{ImageView, OwnedImage};
use crate::util::math::round_isize;
use crate::util::{TrackError, TrackResult};
use std::sync::Arc;

mod mask;
mod plan;

pub use mask::{Mask, MaskGeometry};
pub use plan::MaskedTemplatePlan;

/// Grayscale template patch with the mask that shapes it.
///
/// The pixel box is always rectangular; the mask marks the pixels that take
/// part in matching.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    img: OwnedImage,
    mask: Arc<Mask>,
}

impl Template {
    /// Creates an unmasked template from a contiguous grayscale buffer.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> TrackResult<Self> {
        let img = OwnedImage::new(data, width, height)?;
        let mask = Mask::full(width, height)?;
        Ok(Self {
            img,
            mask: Arc::new(mask),
        })
    }

    /// Pairs an image with a mask of the same size.
    pub fn with_mask(img: OwnedImage, mask: Mask) -> TrackResult<Self> {
        Self::with_shared_mask(img, Arc::new(mask))
    }

    fn with_shared_mask(img: OwnedImage, mask: Arc<Mask>) -> TrackResult<Self> {
        if img.width() != mask.width() || img.height() != mask.height() {
            return Err(TrackError::ShapeMismatch {
                expected_width: mask.width(),
                expected_height: mask.height(),
                width: img.width(),
                height: img.height(),
            });
        }
        Ok(Self { img, mask })
    }

    /// Copies the template box around `center` out of `frame`.
    ///
    /// `center` lands on the anchor pixel of the box. Fails with
    /// `RoiOutOfBounds` if the box does not lie fully inside the frame.
    pub fn capture(
        frame: ImageView<'_, u8>,
        center: Point,
        geometry: &MaskGeometry,
    ) -> TrackResult<Self> {
        let mask = geometry.build_mask()?;
        let (x, y) = top_left_for(center, geometry);
        let (width, height) = (geometry.width, geometry.height);
        if x < 0 || y < 0 {
            return Err(TrackError::RoiOutOfBounds {
                x: x.max(0) as usize,
                y: y.max(0) as usize,
                width,
                height,
                img_width: frame.width(),
                img_height: frame.height(),
            });
        }
        let roi = frame.roi(x as usize, y as usize, width, height)?;
        Self::with_mask(OwnedImage::from_view(roi)?, mask)
    }

    /// Builds a template with new pixels and this template's mask.
    pub fn with_pixels(&self, img: OwnedImage) -> TrackResult<Self> {
        Self::with_shared_mask(img, Arc::clone(&self.mask))
    }

    /// Returns a borrowed view of the template pixels.
    pub fn view(&self) -> ImageView<'_, u8> {
        self.img.view()
    }

    pub fn width(&self) -> usize {
        self.img.width()
    }

    pub fn height(&self) -> usize {
        self.img.height()
    }

    /// Template pixels in row-major order.
    pub fn pixels(&self) -> &[u8] {
        self.img.data()
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    /// Anchor pixel, where the tracked center sits inside the box.
    pub fn anchor(&self) -> (usize, usize) {
        (self.width() / 2, self.height() / 2)
    }
}

/// Signed top-left corner of a template box centered on `center`.
pub(crate) fn top_left_for(center: Point, geometry: &MaskGeometry) -> (isize, isize) {
    let (ax, ay) = geometry.anchor();
    (
        round_isize(center.x) - ax as isize,
        round_isize(center.y) - ay as isize,
    )
}
