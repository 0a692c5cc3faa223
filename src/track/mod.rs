//! Tracking state machine: per-frame records, key frames and the tracker.

mod cache;
mod cancel;
mod frame;
mod tracker;

pub use self::cache::FrameCache;
pub use self::cancel::CancelFlag;
pub use self::frame::{FrameData, FrameFailure, KeyFrame, MatchState, TargetPoint, TrackId};
pub use self::tracker::{Advance, AutoTracker};
