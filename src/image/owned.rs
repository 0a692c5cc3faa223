//! Owned contiguous grayscale images.

use crate::image::ImageView;
use crate::util::{TrackError, TrackResult};

/// Owned contiguous grayscale image buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl OwnedImage {
    /// Wraps a contiguous row-major buffer of exactly `width * height` bytes.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> TrackResult<Self> {
        if width == 0 || height == 0 {
            return Err(TrackError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .ok_or(TrackError::InvalidDimensions { width, height })?;
        if data.len() < needed {
            return Err(TrackError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(TrackError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Creates an image filled with a constant value.
    pub fn filled(width: usize, height: usize, value: u8) -> TrackResult<Self> {
        let len = width
            .checked_mul(height)
            .ok_or(TrackError::InvalidDimensions { width, height })?;
        Self::new(vec![value; len], width, height)
    }

    /// Copies a (possibly strided) view into a contiguous buffer.
    pub fn from_view(view: ImageView<'_, u8>) -> TrackResult<Self> {
        let width = view.width();
        let height = view.height();
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            let row = view.row(y).ok_or(TrackError::BufferTooSmall {
                needed: (y + 1) * view.stride(),
                got: view.as_slice().len(),
            })?;
            data.extend_from_slice(row);
        }
        Self::new(data, width, height)
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> ImageView<'_, u8> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the pixel data in row-major order.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::OwnedImage;
    use crate::util::TrackError;

    #[test]
    fn rejects_wrong_length() {
        let err = OwnedImage::new(vec![0u8; 5], 2, 2).unwrap_err();
        assert_eq!(err, TrackError::InvalidDimensions { width: 2, height: 2 });
    }

    #[test]
    fn from_view_copies_roi() {
        let data: Vec<u8> = (0u8..16).collect();
        let img = OwnedImage::new(data, 4, 4).unwrap();
        let roi = img.view().roi(1, 2, 2, 2).unwrap();
        let copy = OwnedImage::from_view(roi).unwrap();
        assert_eq!(copy.data(), &[9, 10, 13, 14]);
    }
}
