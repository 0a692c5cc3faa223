//! Search-region prediction from recent trajectory.
//!
//! Trusted positions (key frames and good matches) from the last
//! [`PREDICTION_LOOK_BACK`] frames are fit with a constant-velocity model
//! against their frame index, so frames skipped by failed matches stretch
//! the extrapolation instead of distorting it.

use crate::geometry::{Point, SearchWindow};
use crate::options::PREDICTION_LOOK_BACK;
use crate::util::math::linear_fit;

/// A trusted target position at a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrajectorySample {
    pub frame: usize,
    pub position: Point,
}

impl TrajectorySample {
    pub fn new(frame: usize, position: Point) -> Self {
        Self { frame, position }
    }
}

/// Predicts where the target center will be at `next_frame`.
///
/// `history` must be sorted by ascending frame and contain only frames
/// before `next_frame`. Samples older than `PREDICTION_LOOK_BACK` frames
/// are ignored. With `look_ahead` off, or fewer than two usable samples,
/// the most recent sample is returned, or `fallback` when there is none.
pub fn predict(
    history: &[TrajectorySample],
    fallback: Point,
    next_frame: usize,
    look_ahead: bool,
) -> Point {
    let oldest = next_frame.saturating_sub(PREDICTION_LOOK_BACK);
    let recent: Vec<TrajectorySample> = history
        .iter()
        .copied()
        .filter(|s| s.frame >= oldest && s.frame < next_frame)
        .collect();
    let Some(last) = recent.last().copied() else {
        return history.last().map_or(fallback, |s| s.position);
    };
    if !look_ahead || recent.len() < 2 {
        return last.position;
    }

    // Fit relative to the newest frame to keep the values small.
    let rel = |frame: usize| frame as f32 - last.frame as f32;
    let xs: Vec<(f32, f32)> = recent
        .iter()
        .map(|s| (rel(s.frame), s.position.x))
        .collect();
    let ys: Vec<(f32, f32)> = recent
        .iter()
        .map(|s| (rel(s.frame), s.position.y))
        .collect();
    let t = rel(next_frame);
    match (linear_fit(&xs), linear_fit(&ys)) {
        (Some((sx, ix)), Some((sy, iy))) => Point::new(sx * t + ix, sy * t + iy),
        _ => last.position,
    }
}

/// Search window around a predicted template center.
///
/// The half-extent is half the template plus `margin`, where the margin is
/// multiplied by `1 + failures` so the window widens after misses. The
/// window is clipped to the frame; `None` if nothing of it remains.
pub fn search_window(
    center: Point,
    template: (usize, usize),
    margin: usize,
    failures: usize,
    frame: (usize, usize),
) -> Option<SearchWindow> {
    let grown = margin.saturating_mul(failures.saturating_add(1));
    SearchWindow::centered(
        center,
        (template.0 / 2).saturating_add(grown),
        (template.1 / 2).saturating_add(grown),
        frame.0,
        frame.1,
    )
}
