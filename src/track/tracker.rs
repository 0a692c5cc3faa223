//! Frame-by-frame tracking loop.

use crate::evolve::evolve;
use crate::geometry::{Point, SearchLine, SearchWindow};
use crate::image::{FrameSource, ImageView};
use crate::options::{OptionValues, Options, TrackingMode, PREDICTION_LOOK_BACK};
use crate::predict::{predict, search_window, TrajectorySample};
use crate::search::{MatchOutcome, MatcherConfig, TemplateMatcher, MAX_MATCH_SCORE};
use crate::template::{MaskGeometry, MaskedTemplatePlan, Template};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::track::{
    CancelFlag, FrameCache, FrameData, FrameFailure, KeyFrame, MatchState, TargetPoint, TrackId,
};
use crate::util::{TrackError, TrackResult};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Result of an auto-advance request.
#[derive(Clone, Debug, PartialEq)]
pub enum Advance {
    /// The requested frame was computed (or already cached).
    Reached(FrameData),
    /// Too many consecutive failures; `frame` is the frame that tipped it.
    Halted {
        frame: usize,
        consecutive_failures: usize,
    },
    /// The cancel flag was raised; `last_frame` is the last finished frame.
    Cancelled { last_frame: usize },
    /// No key frame at or before the requested frame.
    NoKeyFrame,
}

/// Key-frame state copied out for one walk.
struct Baseline {
    index: usize,
    mask_center: Point,
    offset: (f32, f32),
    geometry: MaskGeometry,
}

impl Baseline {
    fn of(key_frame: &KeyFrame) -> Self {
        Self {
            index: key_frame.frame(),
            mask_center: key_frame.mask_center(),
            offset: key_frame.target_offset(),
            geometry: *key_frame.geometry(),
        }
    }

    fn center_of(&self, target: Point) -> Point {
        Point::new(target.x - self.offset.0, target.y - self.offset.1)
    }

    fn target_of(&self, center: Point) -> Point {
        Point::new(center.x + self.offset.0, center.y + self.offset.1)
    }
}

/// Tracks one target through a frame source.
///
/// The tracker owns its options, key frames and cache. Frames are computed
/// lazily: [`get_frame`](Self::get_frame) and [`advance_to`](Self::advance_to)
/// walk forward from the nearest key frame, reusing valid cached frames.
pub struct AutoTracker<S: FrameSource> {
    source: S,
    options: Options,
    revision: Arc<AtomicU64>,
    geometry_pending: Arc<AtomicBool>,
    matcher: TemplateMatcher,
    track: Option<TrackId>,
    key_frames: BTreeMap<usize, KeyFrame>,
    cache: FrameCache,
}

impl<S: FrameSource> AutoTracker<S> {
    pub fn new(source: S) -> Self {
        Self::with_options(source, Options::default())
    }

    /// Creates a tracker using `options`; existing listeners are kept.
    pub fn with_options(source: S, mut options: Options) -> Self {
        let revision = Arc::new(AtomicU64::new(0));
        let geometry_pending = Arc::new(AtomicBool::new(false));
        let counter = Arc::clone(&revision);
        let pending = Arc::clone(&geometry_pending);
        options.subscribe(move |change| {
            trace_event!("option_changed", field = change.field());
            counter.fetch_add(1, Ordering::Relaxed);
            if change.affects_geometry() {
                trace_event!("geometry_deferred", field = change.field());
                pending.store(true, Ordering::Relaxed);
            }
        });
        Self {
            source,
            options,
            revision,
            geometry_pending,
            matcher: TemplateMatcher::new(),
            track: None,
            key_frames: BTreeMap::new(),
            cache: FrameCache::new(),
        }
    }

    pub fn with_matcher_config(mut self, cfg: MatcherConfig) -> Self {
        self.matcher = self.matcher.with_config(cfg);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Mutable options. Changes apply to frames computed afterwards;
    /// geometry changes wait for the next key frame.
    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    /// Number of option changes seen so far.
    pub fn options_revision(&self) -> u64 {
        self.revision.load(Ordering::Relaxed)
    }

    /// True when a mask geometry option changed since the last key frame
    /// was added; the new geometry is used from the next key frame on.
    pub fn geometry_pending(&self) -> bool {
        self.geometry_pending.load(Ordering::Relaxed)
    }

    pub fn track(&self) -> Option<TrackId> {
        self.track
    }

    /// Binds the tracker to a track and returns the previous binding.
    ///
    /// Switching to a different track drops all key frames and cached frames.
    pub fn set_track(&mut self, track: Option<TrackId>) -> Option<TrackId> {
        if track != self.track {
            self.key_frames.clear();
            self.cache.clear();
            trace_event!("track_bound", bound = track.is_some());
        }
        std::mem::replace(&mut self.track, track)
    }

    pub fn key_frame(&self, frame: usize) -> Option<&KeyFrame> {
        self.key_frames.get(&frame)
    }

    /// Key frames in frame order.
    pub fn key_frames(&self) -> impl Iterator<Item = &KeyFrame> + '_ {
        self.key_frames.values()
    }

    /// Cached record for `frame`, which may be stale.
    pub fn cached_frame(&self, frame: usize) -> Option<&FrameData> {
        self.cache.get(frame)
    }

    /// Adds or replaces the key frame at `target.frame`.
    ///
    /// The template is captured with the current mask geometry centered on
    /// `(center_x, center_y)` rounded to the pixel grid; the target may sit
    /// elsewhere and keeps its offset on every tracked frame. Frames governed by the replaced
    /// baseline are invalidated.
    pub fn add_key_frame(
        &mut self,
        target: TargetPoint,
        center_x: f32,
        center_y: f32,
    ) -> TrackResult<&KeyFrame> {
        self.require_track()?;
        let index = target.frame;
        self.check_frame(index)?;
        let _span = trace_span!("add_key_frame", frame = index).entered();

        let geometry = MaskGeometry::from_options(&self.options.values())?;
        // Matched centers land on the capture grid, so the offset is taken
        // from the rounded center.
        let mask_center = Point::new(center_x.round(), center_y.round());
        let snapshot = Arc::new(Template::capture(
            self.load_frame(index)?,
            mask_center,
            &geometry,
        )?);
        let data = FrameData {
            frame: index,
            location: Some(target.point()),
            score: Some(MAX_MATCH_SCORE),
            state: MatchState::KeyFrame,
            key_frame: Some(index),
            valid: true,
            failure: None,
            consecutive_failures: 0,
            halted: false,
            search_window: None,
            options_revision: self.options_revision(),
            template: Some(Arc::clone(&snapshot)),
        };
        let key_frame = KeyFrame {
            data,
            target: target.point(),
            mask_center,
            geometry,
            snapshot,
        };

        let end = self.next_key_frame_after(index);
        let stale = self.cache.invalidate_range(index, end);
        trace_event!("key_frame_added", frame = index, invalidated = stale);

        let slot = match self.key_frames.entry(index) {
            Entry::Occupied(mut entry) => {
                entry.insert(key_frame);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(key_frame),
        };
        self.geometry_pending.store(false, Ordering::Relaxed);
        Ok(slot)
    }

    /// Removes the key frame at `frame` and invalidates what it governed.
    pub fn remove_key_frame(&mut self, frame: usize) -> TrackResult<Option<KeyFrame>> {
        self.require_track()?;
        let Some(removed) = self.key_frames.remove(&frame) else {
            return Ok(None);
        };
        let end = self.next_key_frame_after(frame);
        let stale = self.cache.invalidate_range(frame, end);
        trace_event!("key_frame_removed", frame = frame, invalidated = stale);
        Ok(Some(removed))
    }

    /// Marks every cached frame at or after `frame` stale.
    pub fn invalidate_from(&mut self, frame: usize) -> usize {
        let stale = self.cache.invalidate_from(frame);
        trace_event!("invalidated", from = frame, count = stale);
        stale
    }

    /// Returns the record for frame `n`, computing it if needed.
    ///
    /// Frames that cannot be reached (no key frame yet, or tracking halted
    /// earlier in the baseline) come back as `Unprocessed`.
    pub fn get_frame(&mut self, n: usize) -> TrackResult<FrameData> {
        self.require_track()?;
        self.check_frame(n)?;
        if let Some(key_frame) = self.key_frames.get(&n) {
            return Ok(key_frame.data.clone());
        }
        if let Some(data) = self.cache.valid(n) {
            return Ok(data.clone());
        }
        self.walk(n, None)?;
        Ok(self
            .cache
            .valid(n)
            .cloned()
            .unwrap_or_else(|| FrameData::unprocessed(n)))
    }

    /// Tracks forward to frame `n`, stopping early on a halt or cancel.
    pub fn advance_to(&mut self, n: usize, cancel: Option<&CancelFlag>) -> TrackResult<Advance> {
        self.require_track()?;
        self.check_frame(n)?;
        let _span = trace_span!("advance", to_frame = n).entered();
        self.walk(n, cancel)
    }

    fn walk(&mut self, target: usize, cancel: Option<&CancelFlag>) -> TrackResult<Advance> {
        let Some(key_frame) = self.key_frames.range(..=target).next_back().map(|(_, k)| k) else {
            return Ok(Advance::NoKeyFrame);
        };
        let baseline = Baseline::of(key_frame);
        let mut prev = key_frame.data.clone();

        let mut frame = baseline.index + 1;
        while frame <= target {
            let Some(cached) = self.cache.valid(frame) else {
                break;
            };
            if cached.is_halted() {
                return Ok(Advance::Halted {
                    frame,
                    consecutive_failures: cached.consecutive_failures(),
                });
            }
            prev = cached.clone();
            frame += 1;
        }

        while frame <= target {
            if cancel.is_some_and(CancelFlag::is_cancelled) {
                trace_event!("advance_cancelled", last_frame = prev.frame());
                return Ok(Advance::Cancelled {
                    last_frame: prev.frame(),
                });
            }
            let data = self.compute_frame(&baseline, frame, &prev)?;
            trace_event!(
                "frame_tracked",
                frame = frame,
                state = data.state().as_str(),
                score = data.score().unwrap_or(0.0),
                failures = data.consecutive_failures()
            );
            let halted = data.is_halted();
            let failures = data.consecutive_failures();
            self.cache.insert(data.clone());
            if halted {
                trace_warn!(
                    "advance_halted",
                    frame = frame,
                    consecutive_failures = failures
                );
                return Ok(Advance::Halted {
                    frame,
                    consecutive_failures: failures,
                });
            }
            prev = data;
            frame += 1;
        }
        Ok(Advance::Reached(prev))
    }

    /// Runs predict, match, classify and evolve for one frame.
    fn compute_frame(
        &self,
        baseline: &Baseline,
        frame: usize,
        prev: &FrameData,
    ) -> TrackResult<FrameData> {
        let values = self.options.values();
        let image = self.load_frame(frame)?;
        let running = match &prev.template {
            Some(t) => Arc::clone(t),
            None => return Err(TrackError::FrameUnavailable { index: prev.frame() }),
        };

        let history = self.history(baseline, frame);
        let fallback = self.last_known_center(baseline, frame);
        let predicted = predict(&history, fallback, frame, values.look_ahead);
        let line = match baseline.geometry.mode {
            TrackingMode::Area => None,
            TrackingMode::Line { .. } => Some(SearchLine::new(
                baseline.mask_center,
                baseline.geometry.line_angle_deg,
            )),
        };
        let center = line.map_or(predicted, |l| l.snap(predicted));
        let window = search_window(
            center,
            (running.width(), running.height()),
            values.search_margin,
            prev.consecutive_failures(),
            (image.width(), image.height()),
        );

        let outcome = match window {
            Some(window) => self.search(image, &running, window, line.as_ref())?,
            None => Err(FrameFailure::SearchOutOfBounds),
        };
        self.record(baseline, frame, prev, &values, image, running, window, outcome)
    }

    fn search(
        &self,
        image: ImageView<'_, u8>,
        running: &Template,
        window: SearchWindow,
        line: Option<&SearchLine>,
    ) -> TrackResult<Result<MatchOutcome, FrameFailure>> {
        let plan = match MaskedTemplatePlan::from_template(running) {
            Ok(plan) => plan,
            Err(TrackError::DegenerateTemplate { .. }) => {
                return Ok(Err(FrameFailure::DegenerateTemplate))
            }
            Err(err) => return Err(err),
        };
        let found = match line {
            Some(line) => self.matcher.match_line(image, &plan, window, line),
            None => self.matcher.match_area(image, &plan, window),
        };
        match found {
            Ok(Some(outcome)) => Ok(Ok(outcome)),
            Ok(None) => Ok(Err(FrameFailure::MatchNotFound)),
            Err(TrackError::SearchOutOfBounds { .. }) => Ok(Err(FrameFailure::SearchOutOfBounds)),
            Err(err) => Err(err),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        &self,
        baseline: &Baseline,
        frame: usize,
        prev: &FrameData,
        values: &OptionValues,
        image: ImageView<'_, u8>,
        running: Arc<Template>,
        window: Option<SearchWindow>,
        outcome: Result<MatchOutcome, FrameFailure>,
    ) -> TrackResult<FrameData> {
        let (state, score, location, failure) = match &outcome {
            Ok(found) => {
                let state = MatchState::classify(Some(found.score), values.good_match);
                let location =
                    (state != MatchState::NoMatch).then(|| baseline.target_of(found.center));
                let failure = (state == MatchState::NoMatch).then_some(FrameFailure::MatchNotFound);
                (state, Some(found.score), location, failure)
            }
            Err(failure) => (MatchState::NoMatch, None, None, Some(*failure)),
        };

        let template = match (&outcome, state) {
            (Ok(found), MatchState::GoodMatch) => {
                let patch = image.roi(found.x, found.y, running.width(), running.height())?;
                Arc::new(evolve(&running, patch, values.evolve_alpha)?)
            }
            _ => running,
        };
        let consecutive_failures = if state.is_failure() {
            prev.consecutive_failures() + 1
        } else {
            0
        };

        Ok(FrameData {
            frame,
            location,
            score,
            state,
            key_frame: Some(baseline.index),
            valid: true,
            failure,
            consecutive_failures,
            halted: consecutive_failures > values.auto_skip_count,
            search_window: window,
            options_revision: self.options_revision(),
            template: Some(template),
        })
    }

    /// Trusted template centers within the look-back of `frame`.
    fn history(&self, baseline: &Baseline, frame: usize) -> Vec<TrajectorySample> {
        let start = frame.saturating_sub(PREDICTION_LOOK_BACK).max(baseline.index);
        (start..frame)
            .filter_map(|f| {
                let data = if f == baseline.index {
                    self.key_frames.get(&f).map(|k| &k.data)
                } else {
                    self.cache.valid(f)
                }?;
                if !data.state().is_trusted() {
                    return None;
                }
                let location = data.location()?;
                Some(TrajectorySample::new(f, baseline.center_of(location)))
            })
            .collect()
    }

    fn last_known_center(&self, baseline: &Baseline, frame: usize) -> Point {
        self.cache
            .valid_between_rev(baseline.index, frame)
            .filter(|d| d.state().is_trusted())
            .find_map(FrameData::location)
            .map_or(baseline.mask_center, |p| baseline.center_of(p))
    }

    fn next_key_frame_after(&self, frame: usize) -> Option<usize> {
        self.key_frames
            .range(frame.saturating_add(1)..)
            .next()
            .map(|(&k, _)| k)
    }

    fn require_track(&self) -> TrackResult<()> {
        self.track.map(|_| ()).ok_or(TrackError::NoTrackBound)
    }

    fn check_frame(&self, index: usize) -> TrackResult<()> {
        let len = self.source.frame_count();
        if index >= len {
            return Err(TrackError::FrameOutOfRange { index, len });
        }
        Ok(())
    }

    fn load_frame(&self, index: usize) -> TrackResult<ImageView<'_, u8>> {
        self.source
            .frame(index)
            .ok_or(TrackError::FrameUnavailable { index })
    }
}

impl<S: FrameSource> std::fmt::Debug for AutoTracker<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoTracker")
            .field("track", &self.track)
            .field("options", &self.options)
            .field("key_frames", &self.key_frames.keys().collect::<Vec<_>>())
            .field("cached", &self.cache.len())
            .finish()
    }
}
