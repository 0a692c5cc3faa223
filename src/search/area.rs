//! Dense 2-D search over a window.

use crate::candidate::topk::Peak;
use crate::geometry::{Point, SearchWindow};
use crate::kernel::scalar::{zncc_at, ZnccMaskedScalar};
use crate::kernel::{Kernel, ScanParams};
use crate::refine::quad2d::refine_subpixel_2d;
use crate::search::{clip_window, plan_anchor, score_from_zncc, MatchOutcome, MatcherConfig};
use crate::template::MaskedTemplatePlan;
use crate::trace::{trace_event, trace_span};
use crate::util::TrackResult;
use crate::ImageView;

/// Scans every template placement inside `window` and refines the best one.
pub fn match_area(
    frame: ImageView<'_, u8>,
    plan: &MaskedTemplatePlan,
    window: SearchWindow,
    cfg: &MatcherConfig,
) -> TrackResult<Option<MatchOutcome>> {
    let window = clip_window(frame, plan, window)?;
    let (tpl_width, tpl_height) = (plan.width(), plan.height());
    let Some((x0, y0, x1, y1)) = window.placements(tpl_width, tpl_height) else {
        return Ok(None);
    };
    let _span = trace_span!(
        "match_area",
        placements = (x1 - x0 + 1) * (y1 - y0 + 1)
    )
    .entered();

    let params = ScanParams {
        topk: 1,
        min_var_i: cfg.min_var_i,
        min_score: f32::NEG_INFINITY,
    };
    let peaks = scan(frame, plan, (x0, y0, x1, y1), params, cfg.parallel)?;
    let Some(best) = peaks.first().copied() else {
        trace_event!("match_area_empty", x0 = x0, y0 = y0);
        return Ok(None);
    };

    let mut s = [[f32::NEG_INFINITY; 3]; 3];
    for (iy, dy) in [-1isize, 0, 1].into_iter().enumerate() {
        for (ix, dx) in [-1isize, 0, 1].into_iter().enumerate() {
            let x = best.x as isize + dx;
            let y = best.y as isize + dy;
            if x < 0 || y < 0 {
                continue;
            }
            let (x, y) = (x as usize, y as usize);
            if window.holds(x, y, tpl_width, tpl_height) {
                s[iy][ix] = zncc_at(frame, plan, x, y, cfg.min_var_i);
            }
        }
    }
    let (ref_x, ref_y) = refine_subpixel_2d(best.x, best.y, s);
    let (ax, ay) = plan_anchor(plan);

    Ok(Some(MatchOutcome {
        x: best.x,
        y: best.y,
        center: Point::new(ref_x + ax, ref_y + ay),
        zncc: best.score,
        score: score_from_zncc(best.score),
    }))
}

#[cfg(feature = "rayon")]
fn scan(
    frame: ImageView<'_, u8>,
    plan: &MaskedTemplatePlan,
    range: (usize, usize, usize, usize),
    params: ScanParams,
    parallel: bool,
) -> TrackResult<Vec<Peak>> {
    use crate::kernel::rayon::ZnccMaskedRayon;
    let (x0, y0, x1, y1) = range;
    if parallel {
        <ZnccMaskedRayon as Kernel>::scan_roi(frame, plan, x0, y0, x1, y1, params)
    } else {
        <ZnccMaskedScalar as Kernel>::scan_roi(frame, plan, x0, y0, x1, y1, params)
    }
}

#[cfg(not(feature = "rayon"))]
fn scan(
    frame: ImageView<'_, u8>,
    plan: &MaskedTemplatePlan,
    range: (usize, usize, usize, usize),
    params: ScanParams,
    _parallel: bool,
) -> TrackResult<Vec<Peak>> {
    let (x0, y0, x1, y1) = range;
    <ZnccMaskedScalar as Kernel>::scan_roi(frame, plan, x0, y0, x1, y1, params)
}
