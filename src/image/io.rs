//! Helpers for loading frames via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::{ImageView, OwnedImage};
use crate::util::{TrackError, TrackResult};
use std::path::Path;

/// Creates a borrowed view from a grayscale image buffer.
pub fn view_from_gray_image(img: &image::GrayImage) -> TrackResult<ImageView<'_, u8>> {
    ImageView::from_slice(img.as_raw(), img.width() as usize, img.height() as usize)
}

/// Creates an owned luma frame from any decoded image.
pub fn owned_from_dynamic_image(img: &image::DynamicImage) -> TrackResult<OwnedImage> {
    let gray = img.to_luma8();
    let width = gray.width() as usize;
    let height = gray.height() as usize;
    OwnedImage::new(gray.into_raw(), width, height)
}

/// Loads an image from disk and converts it to a luma frame.
pub fn load_gray_image<P: AsRef<Path>>(path: P) -> TrackResult<OwnedImage> {
    let img = image::open(path).map_err(|err| TrackError::ImageIo {
        reason: err.to_string(),
    })?;
    owned_from_dynamic_image(&img)
}

/// Loads an ordered sequence of frames, failing on the first unreadable file.
pub fn load_frames<I, P>(paths: I) -> TrackResult<Vec<OwnedImage>>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let frames: Vec<OwnedImage> = paths
        .into_iter()
        .map(load_gray_image)
        .collect::<TrackResult<_>>()?;
    if let Some(first) = frames.first() {
        let (width, height) = (first.width(), first.height());
        if let Some(bad) = frames
            .iter()
            .find(|f| f.width() != width || f.height() != height)
        {
            return Err(TrackError::ShapeMismatch {
                expected_width: width,
                expected_height: height,
                width: bad.width(),
                height: bad.height(),
            });
        }
    }
    Ok(frames)
}
