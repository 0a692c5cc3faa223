//! Masked ZNCC correlation kernels.
//!
//! Kernels score template placements given by their top-left corner. Scores
//! are raw ZNCC values in `[-1, 1]`; placements that cannot be scored (out of
//! range, flat image window) yield `f32::NEG_INFINITY` from `score_at` and are
//! skipped by scans.

use crate::candidate::topk::Peak;
use crate::util::TrackResult;
use crate::ImageView;

/// Scan configuration for kernel evaluations.
#[derive(Clone, Copy, Debug)]
pub struct ScanParams {
    /// Maximum number of peaks to retain.
    pub topk: usize,
    /// Minimum masked variance of the image window.
    pub min_var_i: f32,
    /// Minimum raw score to retain a peak.
    pub min_score: f32,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            topk: 1,
            min_var_i: 1e-6,
            min_score: f32::NEG_INFINITY,
        }
    }
}

/// Kernel trait for scoring and scan operations.
pub trait Kernel {
    type Plan;

    /// Computes the score at a single placement (top-left coordinates).
    fn score_at(
        image: ImageView<'_, u8>,
        plan: &Self::Plan,
        x: usize,
        y: usize,
        min_var_i: f32,
    ) -> f32;

    /// Scans placements with top-left in `[x0, x1] x [y0, y1]` and returns
    /// the top-K peaks. The range is clamped to placements inside the image.
    #[allow(clippy::too_many_arguments)]
    fn scan_roi(
        image: ImageView<'_, u8>,
        plan: &Self::Plan,
        x0: usize,
        y0: usize,
        x1: usize,
        y1: usize,
        params: ScanParams,
    ) -> TrackResult<Vec<Peak>>;
}

pub mod scalar;

#[cfg(feature = "rayon")]
pub mod rayon;
