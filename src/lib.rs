//! Template-based point tracking for video frames.
//!
//! A user marks a target on a key frame; the tracker captures a masked
//! template around it and follows the target through later frames by
//! predicting a search window, matching the template with masked ZNCC,
//! classifying the match and slowly adapting the template. Tracking halts
//! after too many consecutive failed matches so the user can add another
//! key frame.
//!
//! Optional features: `rayon` (row-parallel search), `image-io` (load
//! frames with the `image` crate) and `tracing` (spans and events).

mod candidate;
pub mod evolve;
pub mod geometry;
pub mod image;
pub mod kernel;
pub mod lowlevel;
pub mod options;
pub mod predict;
mod refine;
pub mod search;
pub mod template;
mod trace;
pub mod track;
pub mod util;

pub use geometry::{Point, SearchLine, SearchWindow};
pub use image::{FrameSource, ImageView, OwnedImage};
pub use options::{
    MaskShape, OptionChange, OptionValues, Options, TrackingMode, POSSIBLE_MATCH,
    PREDICTION_LOOK_BACK,
};
pub use search::{MatchOutcome, MatcherConfig, TemplateMatcher, MAX_MATCH_SCORE};
pub use template::{Mask, MaskGeometry, MaskedTemplatePlan, Template};
pub use track::{
    Advance, AutoTracker, CancelFlag, FrameData, FrameFailure, KeyFrame, MatchState, TargetPoint,
    TrackId,
};
pub use util::{TrackError, TrackResult};

pub use candidate::topk::{Peak, TopK};
