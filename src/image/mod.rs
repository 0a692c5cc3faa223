//! Image views, owned frames, and frame access.
//!
//! `ImageView` is a borrowed 2D view into a 1D grayscale buffer with an
//! explicit stride (elements between row starts). ROI slices are zero-copy
//! and keep the parent stride, so a template-sized window of a video frame
//! can be handed to the kernels without copying.

use crate::util::{TrackError, TrackResult};

#[cfg(feature = "image-io")]
pub mod io;
mod owned;
mod source;

pub use owned::OwnedImage;
pub use source::FrameSource;

/// Borrowed 2D image view with an explicit stride.
#[derive(Copy, Clone, Debug)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> TrackResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride.
    pub fn new(data: &'a [T], width: usize, height: usize, stride: usize) -> TrackResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(TrackError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the backing slice including any row padding.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Returns the element at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y.checked_mul(self.stride)?.checked_add(x)?;
        self.data.get(idx)
    }

    /// Returns a contiguous slice for row `y` with length `width`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width)?;
        self.data.get(start..end)
    }

    /// Returns true if a `width x height` box at `(x, y)` lies inside the view.
    pub fn contains_box(&self, x: usize, y: usize, width: usize, height: usize) -> bool {
        match (x.checked_add(width), y.checked_add(height)) {
            (Some(end_x), Some(end_y)) => end_x <= self.width && end_y <= self.height,
            _ => false,
        }
    }

    /// Returns a zero-copy ROI view into the same backing buffer.
    pub fn roi(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> TrackResult<ImageView<'a, T>> {
        if width == 0 || height == 0 {
            return Err(TrackError::InvalidDimensions { width, height });
        }
        if !self.contains_box(x, y, width, height) {
            return Err(TrackError::RoiOutOfBounds {
                x,
                y,
                width,
                height,
                img_width: self.width,
                img_height: self.height,
            });
        }

        let start = y
            .checked_mul(self.stride)
            .and_then(|v| v.checked_add(x))
            .ok_or(TrackError::InvalidDimensions {
                width: self.width,
                height: self.height,
            })?;
        let data = self.data.get(start..).ok_or(TrackError::BufferTooSmall {
            needed: start.saturating_add(1),
            got: self.data.len(),
        })?;

        ImageView::new(data, width, height, self.stride)
    }
}

impl ImageView<'_, u8> {
    /// Copies the view into a contiguous owned image.
    pub fn to_owned_image(&self) -> TrackResult<OwnedImage> {
        OwnedImage::from_view(*self)
    }
}

fn required_len(width: usize, height: usize, stride: usize) -> TrackResult<usize> {
    if width == 0 || height == 0 {
        return Err(TrackError::InvalidDimensions { width, height });
    }
    if stride < width {
        return Err(TrackError::InvalidStride { width, stride });
    }
    (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .ok_or(TrackError::InvalidDimensions { width, height })
}
