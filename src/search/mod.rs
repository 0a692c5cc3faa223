//! Template matching inside a search window.
//!
//! The matcher evaluates masked ZNCC for every integer placement of the
//! template inside a window (area search) or along a line (line search),
//! refines the best placement to subpixel precision and converts the raw
//! correlation into a tracking score.
//!
//! # Score scale
//!
//! Raw ZNCC `r` lies in `[-1, 1]`. Tracking scores use the odds
//! `r / (1 - r)`, clamped to `[0, MAX_MATCH_SCORE]`. This puts the
//! possible-match floor of 1 at `r = 0.5`, the default good-match threshold
//! of 4 at `r = 0.8`, and gives a self-match the maximum score.

mod area;
mod line;

use crate::geometry::{Point, SearchLine, SearchWindow};
use crate::kernel::ScanParams;
use crate::template::MaskedTemplatePlan;
use crate::util::{TrackError, TrackResult};
use crate::ImageView;

pub use area::match_area;
pub use line::match_line;

/// Largest score a match can receive (perfect correlation).
pub const MAX_MATCH_SCORE: f32 = 100.0;

/// Converts raw ZNCC into the tracking score scale.
pub fn score_from_zncc(zncc: f32) -> f32 {
    if !zncc.is_finite() || zncc <= 0.0 {
        return 0.0;
    }
    if zncc >= 1.0 {
        return MAX_MATCH_SCORE;
    }
    (zncc / (1.0 - zncc)).min(MAX_MATCH_SCORE)
}

/// Best placement found by a search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchOutcome {
    /// Integer top-left corner of the best placement.
    pub x: usize,
    /// Integer top-left corner of the best placement.
    pub y: usize,
    /// Subpixel position of the template anchor (the tracked center).
    pub center: Point,
    /// Raw ZNCC at the integer placement.
    pub zncc: f32,
    /// Tracking score, see [`score_from_zncc`].
    pub score: f32,
}

/// Matcher configuration.
#[derive(Clone, Copy, Debug)]
pub struct MatcherConfig {
    /// Minimum masked variance of an image window for it to be scored.
    pub min_var_i: f32,
    /// Scan rows in parallel (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            min_var_i: ScanParams::default().min_var_i,
            parallel: false,
        }
    }
}

/// Deterministic template matcher.
#[derive(Clone, Copy, Debug, Default)]
pub struct TemplateMatcher {
    cfg: MatcherConfig,
}

impl TemplateMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, cfg: MatcherConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.cfg
    }

    /// Searches every placement of the template inside `window`.
    ///
    /// Returns `Ok(None)` when no placement could be scored (flat image),
    /// and `SearchOutOfBounds` when the clipped window cannot hold the
    /// template.
    pub fn match_area(
        &self,
        frame: ImageView<'_, u8>,
        plan: &MaskedTemplatePlan,
        window: SearchWindow,
    ) -> TrackResult<Option<MatchOutcome>> {
        match_area(frame, plan, window, &self.cfg)
    }

    /// Searches placements whose anchor lies on `line`, inside `window`.
    pub fn match_line(
        &self,
        frame: ImageView<'_, u8>,
        plan: &MaskedTemplatePlan,
        window: SearchWindow,
        line: &SearchLine,
    ) -> TrackResult<Option<MatchOutcome>> {
        match_line(frame, plan, window, line, &self.cfg)
    }
}

/// Clips `window` to the frame and checks that the template fits.
pub(crate) fn clip_window(
    frame: ImageView<'_, u8>,
    plan: &MaskedTemplatePlan,
    window: SearchWindow,
) -> TrackResult<SearchWindow> {
    let (tpl_width, tpl_height) = (plan.width(), plan.height());
    if tpl_width == 0 || tpl_height == 0 {
        return Err(TrackError::InvalidMaskGeometry {
            width: tpl_width,
            height: tpl_height,
        });
    }
    let out_of_bounds = TrackError::SearchOutOfBounds {
        x: window.x,
        y: window.y,
        width: window.width,
        height: window.height,
        tpl_width,
        tpl_height,
    };
    let clipped = window
        .clip(frame.width(), frame.height())
        .ok_or(out_of_bounds.clone())?;
    if clipped.placements(tpl_width, tpl_height).is_none() {
        return Err(out_of_bounds);
    }
    Ok(clipped)
}

/// Anchor pixel of a plan's template box.
pub(crate) fn plan_anchor(plan: &MaskedTemplatePlan) -> (f32, f32) {
    ((plan.width() / 2) as f32, (plan.height() / 2) as f32)
}

#[cfg(test)]
mod tests {
    use super::{score_from_zncc, MAX_MATCH_SCORE};
    use crate::options::POSSIBLE_MATCH;

    #[test]
    fn score_scale_anchors_thresholds() {
        assert!((score_from_zncc(0.5) - POSSIBLE_MATCH).abs() < 1e-6);
        assert!((score_from_zncc(0.8) - 4.0).abs() < 1e-4);
        assert_eq!(score_from_zncc(1.0), MAX_MATCH_SCORE);
        assert_eq!(score_from_zncc(0.9999), MAX_MATCH_SCORE);
        assert_eq!(score_from_zncc(-0.3), 0.0);
        assert_eq!(score_from_zncc(f32::NEG_INFINITY), 0.0);
    }

    #[test]
    fn score_is_monotonic_in_zncc() {
        let mut prev = score_from_zncc(-1.0);
        for i in -99..=100 {
            let s = score_from_zncc(i as f32 / 100.0);
            assert!(s >= prev);
            prev = s;
        }
    }
}
