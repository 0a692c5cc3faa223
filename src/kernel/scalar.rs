//! Scalar reference kernel for masked ZNCC.

use crate::candidate::topk::{Peak, TopK};
use crate::kernel::{Kernel, ScanParams};
use crate::template::MaskedTemplatePlan;
use crate::util::{TrackError, TrackResult};
use crate::ImageView;

/// Scalar masked ZNCC kernel.
pub struct ZnccMaskedScalar;

/// Masked correlation sums for one placement: `(dot, sum_i, sum_i2)`.
///
/// Accumulates in `f64` so the variance of bright, low-contrast windows does
/// not vanish in cancellation.
#[inline]
fn masked_sums(
    image: ImageView<'_, u8>,
    tpl: &MaskedTemplatePlan,
    x: usize,
    y: usize,
) -> Option<(f64, f64, f64)> {
    let tpl_width = tpl.width();
    let t_prime = tpl.t_prime();
    let mask = tpl.mask();

    let mut dot = 0.0f64;
    let mut sum_i = 0.0f64;
    let mut sum_i2 = 0.0f64;
    for ty in 0..tpl.height() {
        let img_row = image.row(y + ty)?.get(x..x + tpl_width)?;
        let base = ty * tpl_width;
        for (tx, &pixel) in img_row.iter().enumerate() {
            let idx = base + tx;
            if mask[idx] == 0 {
                continue;
            }
            let value = f64::from(pixel);
            dot += f64::from(t_prime[idx]) * value;
            sum_i += value;
            sum_i2 += value * value;
        }
    }
    Some((dot, sum_i, sum_i2))
}

/// Raw masked ZNCC at one placement, or `NEG_INFINITY` if unscorable.
#[inline]
pub(crate) fn zncc_at(
    image: ImageView<'_, u8>,
    tpl: &MaskedTemplatePlan,
    x: usize,
    y: usize,
    min_var_i: f32,
) -> f32 {
    if !image.contains_box(x, y, tpl.width(), tpl.height()) {
        return f32::NEG_INFINITY;
    }
    let var_t = f64::from(tpl.var_t());
    if var_t <= 1e-8 {
        return f32::NEG_INFINITY;
    }
    let Some((dot, sum_i, sum_i2)) = masked_sums(image, tpl, x, y) else {
        return f32::NEG_INFINITY;
    };

    let var_i = sum_i2 - (sum_i * sum_i) / f64::from(tpl.sum_w());
    if var_i <= f64::from(min_var_i) {
        return f32::NEG_INFINITY;
    }

    let score = (dot / (var_t * var_i).sqrt()) as f32;
    if score.is_finite() {
        score.clamp(-1.0, 1.0)
    } else {
        f32::NEG_INFINITY
    }
}

/// Clamps a placement range to the image; `None` if the template cannot fit.
pub(crate) fn clamp_range(
    image: ImageView<'_, u8>,
    tpl: &MaskedTemplatePlan,
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
) -> TrackResult<Option<(usize, usize, usize, usize)>> {
    let img_width = image.width();
    let img_height = image.height();
    let tpl_width = tpl.width();
    let tpl_height = tpl.height();
    if img_width < tpl_width || img_height < tpl_height {
        return Err(TrackError::SearchOutOfBounds {
            x: 0,
            y: 0,
            width: img_width,
            height: img_height,
            tpl_width,
            tpl_height,
        });
    }

    let max_x = img_width - tpl_width;
    let max_y = img_height - tpl_height;
    if x0 > max_x || y0 > max_y {
        return Ok(None);
    }
    let x1 = x1.min(max_x);
    let y1 = y1.min(max_y);
    if x0 > x1 || y0 > y1 {
        return Ok(None);
    }
    Ok(Some((x0, y0, x1, y1)))
}

/// Scores one row of placements into `topk`.
pub(crate) fn scan_row(
    image: ImageView<'_, u8>,
    tpl: &MaskedTemplatePlan,
    y: usize,
    x0: usize,
    x1: usize,
    params: ScanParams,
    topk: &mut TopK,
) {
    for x in x0..=x1 {
        let score = zncc_at(image, tpl, x, y, params.min_var_i);
        if score.is_finite() && score >= params.min_score {
            topk.push(Peak { x, y, score });
        }
    }
}

impl Kernel for ZnccMaskedScalar {
    type Plan = MaskedTemplatePlan;

    fn score_at(
        image: ImageView<'_, u8>,
        tpl: &Self::Plan,
        x: usize,
        y: usize,
        min_var_i: f32,
    ) -> f32 {
        zncc_at(image, tpl, x, y, min_var_i)
    }

    fn scan_roi(
        image: ImageView<'_, u8>,
        tpl: &Self::Plan,
        x0: usize,
        y0: usize,
        x1: usize,
        y1: usize,
        params: ScanParams,
    ) -> TrackResult<Vec<Peak>> {
        if params.topk == 0 {
            return Ok(Vec::new());
        }
        let Some((x0, y0, x1, y1)) = clamp_range(image, tpl, x0, y0, x1, y1)? else {
            return Ok(Vec::new());
        };

        let mut topk = TopK::new(params.topk);
        for y in y0..=y1 {
            scan_row(image, tpl, y, x0, x1, params, &mut topk);
        }
        Ok(topk.into_sorted_desc())
    }
}
