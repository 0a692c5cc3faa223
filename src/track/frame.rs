//! Per-frame tracking records.

use crate::geometry::{Point, SearchWindow};
use crate::options::POSSIBLE_MATCH;
use crate::template::{MaskGeometry, Template};
use std::ops::Deref;
use std::sync::Arc;

/// Identifier of the track a tracker is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub u64);

/// User-supplied target position at a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetPoint {
    pub frame: usize,
    pub x: f32,
    pub y: f32,
}

impl TargetPoint {
    pub fn new(frame: usize, x: f32, y: f32) -> Self {
        Self { frame, x, y }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Tracking state of a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MatchState {
    #[default]
    Unprocessed,
    KeyFrame,
    GoodMatch,
    PossibleMatch,
    NoMatch,
}

impl MatchState {
    /// Classifies a match score against the good-match threshold.
    ///
    /// Scores above `good_match` are good, scores above [`POSSIBLE_MATCH`]
    /// are possible, everything else (including no score) is no match.
    pub fn classify(score: Option<f32>, good_match: f32) -> Self {
        match score {
            Some(s) if s > good_match => Self::GoodMatch,
            Some(s) if s > POSSIBLE_MATCH => Self::PossibleMatch,
            _ => Self::NoMatch,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unprocessed => "unprocessed",
            Self::KeyFrame => "key_frame",
            Self::GoodMatch => "good_match",
            Self::PossibleMatch => "possible_match",
            Self::NoMatch => "no_match",
        }
    }

    /// Key frames and good matches feed prediction and evolution.
    pub fn is_trusted(self) -> bool {
        matches!(self, Self::KeyFrame | Self::GoodMatch)
    }

    /// States that count toward the consecutive-failure limit.
    pub fn is_failure(self) -> bool {
        matches!(self, Self::PossibleMatch | Self::NoMatch)
    }
}

/// Why a processed frame has no usable match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FrameFailure {
    #[error("no region scored above the noise floor")]
    MatchNotFound,
    #[error("search window cannot hold the template")]
    SearchOutOfBounds,
    #[error("running template has no usable variance")]
    DegenerateTemplate,
}

/// Tracking record of one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameData {
    pub(crate) frame: usize,
    pub(crate) location: Option<Point>,
    pub(crate) score: Option<f32>,
    pub(crate) state: MatchState,
    pub(crate) key_frame: Option<usize>,
    pub(crate) valid: bool,
    pub(crate) failure: Option<FrameFailure>,
    pub(crate) consecutive_failures: usize,
    pub(crate) halted: bool,
    pub(crate) search_window: Option<SearchWindow>,
    pub(crate) options_revision: u64,
    pub(crate) template: Option<Arc<Template>>,
}

impl FrameData {
    /// Record for a frame that has not been tracked.
    pub fn unprocessed(frame: usize) -> Self {
        Self {
            frame,
            location: None,
            score: None,
            state: MatchState::Unprocessed,
            key_frame: None,
            valid: false,
            failure: None,
            consecutive_failures: 0,
            halted: false,
            search_window: None,
            options_revision: 0,
            template: None,
        }
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Target location; `None` for unprocessed frames and no-matches.
    pub fn location(&self) -> Option<Point> {
        self.location
    }

    pub fn score(&self) -> Option<f32> {
        self.score
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    /// Index of the key frame whose baseline produced this record.
    pub fn key_frame(&self) -> Option<usize> {
        self.key_frame
    }

    /// False once a later edit made this record stale.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn failure(&self) -> Option<FrameFailure> {
        self.failure
    }

    /// Failed frames in a row up to and including this one.
    pub fn consecutive_failures(&self) -> usize {
        self.consecutive_failures
    }

    /// True on the frame where the failure limit was exceeded.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Window searched for this frame.
    pub fn search_window(&self) -> Option<SearchWindow> {
        self.search_window
    }

    /// Options revision in effect when this frame was computed.
    pub fn options_revision(&self) -> u64 {
        self.options_revision
    }

    /// Running template after processing this frame.
    pub fn template(&self) -> Option<&Template> {
        self.template.as_deref()
    }
}

/// A user-confirmed frame anchoring a template and target position.
#[derive(Clone, Debug)]
pub struct KeyFrame {
    pub(crate) data: FrameData,
    pub(crate) target: Point,
    pub(crate) mask_center: Point,
    pub(crate) geometry: MaskGeometry,
    pub(crate) snapshot: Arc<Template>,
}

impl KeyFrame {
    pub fn target(&self) -> Point {
        self.target
    }

    /// Point the template box is centered on.
    pub fn mask_center(&self) -> Point {
        self.mask_center
    }

    /// Offset from the mask center to the target.
    pub fn target_offset(&self) -> (f32, f32) {
        (
            self.target.x - self.mask_center.x,
            self.target.y - self.mask_center.y,
        )
    }

    /// Mask geometry fixed for this baseline.
    pub fn geometry(&self) -> &MaskGeometry {
        &self.geometry
    }

    /// Template captured when the key frame was added.
    pub fn snapshot(&self) -> &Template {
        &self.snapshot
    }

    pub fn data(&self) -> &FrameData {
        &self.data
    }
}

impl Deref for KeyFrame {
    type Target = FrameData;

    fn deref(&self) -> &FrameData {
        &self.data
    }
}
