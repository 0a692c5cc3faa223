//! Error types for autotrack.
//!
//! These cover programmer misuse and malformed inputs. Tracking-quality
//! outcomes (no match, search out of bounds) are not errors at the tracker
//! level: they are recorded per frame in [`crate::track::FrameData`].

use thiserror::Error;

/// Result alias for autotrack operations.
pub type TrackResult<T> = std::result::Result<T, TrackError>;

/// Errors that can occur when building templates, matching, or tracking.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TrackError {
    /// Image or template dimensions are zero or overflow.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is smaller than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// Backing buffer is shorter than the declared geometry requires.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A region of interest does not fit inside the image.
    #[error(
        "roi out of bounds: ({x}, {y}) {width}x{height} in {img_width}x{img_height} image"
    )]
    RoiOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// Mask width or height is not positive.
    #[error("invalid mask geometry: {width}x{height}")]
    InvalidMaskGeometry { width: usize, height: usize },
    /// The clipped search window cannot contain the template.
    #[error(
        "search out of bounds: window ({x}, {y}) {width}x{height} cannot hold a {tpl_width}x{tpl_height} template"
    )]
    SearchOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        tpl_width: usize,
        tpl_height: usize,
    },
    /// The masked template cannot be correlated.
    #[error("degenerate template: {reason}")]
    DegenerateTemplate { reason: &'static str },
    /// Two buffers that must share a shape do not.
    #[error("shape mismatch: expected {expected_width}x{expected_height}, got {width}x{height}")]
    ShapeMismatch {
        expected_width: usize,
        expected_height: usize,
        width: usize,
        height: usize,
    },
    /// A tracking call was made before a track was bound.
    #[error("no track bound to the tracker")]
    NoTrackBound,
    /// A frame index is outside the frame source.
    #[error("frame {index} out of range (frame count {len})")]
    FrameOutOfRange { index: usize, len: usize },
    /// The frame source could not supply an image for a valid index.
    #[error("frame {index} unavailable from source")]
    FrameUnavailable { index: usize },
    /// An option value was rejected.
    #[error("invalid option {name}: {reason}")]
    InvalidOption {
        name: &'static str,
        reason: &'static str,
    },
    /// Image decoding failed (`image-io` feature).
    #[error("image io: {reason}")]
    ImageIo { reason: String },
}
