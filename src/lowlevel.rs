//! Low-level building blocks for custom matching pipelines.
//!
//! These expose the correlation kernels, template plans and subpixel
//! helpers underneath [`TemplateMatcher`](crate::TemplateMatcher). Most
//! users should drive tracking through [`AutoTracker`](crate::AutoTracker).

pub use crate::candidate::topk::{Peak, TopK};
#[cfg(feature = "rayon")]
pub use crate::kernel::rayon::ZnccMaskedRayon;
pub use crate::kernel::scalar::ZnccMaskedScalar;
pub use crate::kernel::{Kernel, ScanParams};
pub use crate::predict::{predict, search_window, TrajectorySample};
pub use crate::refine::quad1d::quad_peak_offset_1d;
pub use crate::refine::quad2d::refine_subpixel_2d;
pub use crate::search::{match_area, match_line, score_from_zncc};
pub use crate::template::MaskedTemplatePlan;
