//! 1-D search along a tracking line.

use crate::geometry::{Point, SearchLine, SearchWindow};
use crate::kernel::scalar::zncc_at;
use crate::refine::quad1d::quad_peak_offset_1d;
use crate::search::{clip_window, plan_anchor, score_from_zncc, MatchOutcome, MatcherConfig};
use crate::template::MaskedTemplatePlan;
use crate::trace::trace_span;
use crate::util::{TrackError, TrackResult};
use crate::ImageView;

struct LineSample {
    t: f32,
    x: usize,
    y: usize,
    zncc: f32,
}

/// Scores placements whose anchor sits on `line` at unit steps, keeping
/// those that fit inside `window`, and refines the best along the line.
pub fn match_line(
    frame: ImageView<'_, u8>,
    plan: &MaskedTemplatePlan,
    window: SearchWindow,
    line: &SearchLine,
    cfg: &MatcherConfig,
) -> TrackResult<Option<MatchOutcome>> {
    let window = clip_window(frame, plan, window)?;
    let (tpl_width, tpl_height) = (plan.width(), plan.height());
    let (ax, ay) = plan_anchor(plan);

    let corners = [
        Point::new(window.x as f32, window.y as f32),
        Point::new((window.x + window.width) as f32, window.y as f32),
        Point::new(window.x as f32, (window.y + window.height) as f32),
        Point::new(
            (window.x + window.width) as f32,
            (window.y + window.height) as f32,
        ),
    ];
    let t_min = corners
        .iter()
        .map(|&c| line.project(c))
        .fold(f32::INFINITY, f32::min)
        .floor() as i64;
    let t_max = corners
        .iter()
        .map(|&c| line.project(c))
        .fold(f32::NEG_INFINITY, f32::max)
        .ceil() as i64;
    let _span = trace_span!("match_line", t_min = t_min, t_max = t_max).entered();

    let mut samples: Vec<LineSample> = Vec::new();
    for t in t_min..=t_max {
        let t = t as f32;
        let center = line.at(t);
        let left = (center.x - ax).round();
        let top = (center.y - ay).round();
        if left < 0.0 || top < 0.0 {
            continue;
        }
        let (x, y) = (left as usize, top as usize);
        if !window.holds(x, y, tpl_width, tpl_height) {
            continue;
        }
        if samples.last().is_some_and(|s| s.x == x && s.y == y) {
            continue;
        }
        samples.push(LineSample {
            t,
            x,
            y,
            zncc: zncc_at(frame, plan, x, y, cfg.min_var_i),
        });
    }

    if samples.is_empty() {
        return Err(TrackError::SearchOutOfBounds {
            x: window.x,
            y: window.y,
            width: window.width,
            height: window.height,
            tpl_width,
            tpl_height,
        });
    }

    let mut best_idx: Option<usize> = None;
    for (idx, sample) in samples.iter().enumerate() {
        if !sample.zncc.is_finite() {
            continue;
        }
        match best_idx {
            Some(b) if samples[b].zncc >= sample.zncc => {}
            _ => best_idx = Some(idx),
        }
    }
    let Some(best_idx) = best_idx else {
        return Ok(None);
    };

    let best = &samples[best_idx];
    let neighbour = |idx: Option<usize>| {
        idx.and_then(|i| samples.get(i))
            .filter(|s| (s.t - best.t).abs() <= 1.0 + 1e-3)
            .map_or(f32::NEG_INFINITY, |s| s.zncc)
    };
    let fm = neighbour(best_idx.checked_sub(1));
    let fp = neighbour(Some(best_idx + 1));
    let dt = quad_peak_offset_1d(fm, best.zncc, fp).unwrap_or(0.0);

    // Keep the refined anchor on the line but consistent with the rounded
    // placement that produced the score.
    let on_line = line.at(best.t + dt);
    let rounding = line.at(best.t);
    let center = Point::new(
        best.x as f32 + ax + (on_line.x - rounding.x),
        best.y as f32 + ay + (on_line.y - rounding.y),
    );

    Ok(Some(MatchOutcome {
        x: best.x,
        y: best.y,
        center,
        zncc: best.zncc,
        score: score_from_zncc(best.zncc),
    }))
}
