//! Frame access abstraction.
//!
//! Video decoding lives outside this crate; the tracker only needs random
//! access to grayscale frames by index.

use crate::image::{ImageView, OwnedImage};

/// Random-access supplier of grayscale video frames.
pub trait FrameSource {
    /// Number of frames available.
    fn frame_count(&self) -> usize;

    /// Returns frame `index`, or `None` if it cannot be supplied.
    fn frame(&self, index: usize) -> Option<ImageView<'_, u8>>;
}

impl FrameSource for [OwnedImage] {
    fn frame_count(&self) -> usize {
        self.len()
    }

    fn frame(&self, index: usize) -> Option<ImageView<'_, u8>> {
        self.get(index).map(OwnedImage::view)
    }
}

impl FrameSource for Vec<OwnedImage> {
    fn frame_count(&self) -> usize {
        self.as_slice().frame_count()
    }

    fn frame(&self, index: usize) -> Option<ImageView<'_, u8>> {
        self.as_slice().frame(index)
    }
}

impl<S: FrameSource + ?Sized> FrameSource for &S {
    fn frame_count(&self) -> usize {
        (**self).frame_count()
    }

    fn frame(&self, index: usize) -> Option<ImageView<'_, u8>> {
        (**self).frame(index)
    }
}
