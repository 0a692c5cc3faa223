//! Rayon row-parallel masked ZNCC kernel (feature-gated).
//!
//! Rows of placements are scored in parallel, each into its own Top-K, then
//! merged. Peak ordering is total, so results equal the scalar kernel.

use crate::candidate::topk::{Peak, TopK};
use crate::kernel::scalar::{clamp_range, scan_row, zncc_at};
use crate::kernel::{Kernel, ScanParams};
use crate::template::MaskedTemplatePlan;
use crate::util::TrackResult;
use crate::ImageView;
use rayon::prelude::*;

/// Row-parallel masked ZNCC kernel.
pub struct ZnccMaskedRayon;

impl Kernel for ZnccMaskedRayon {
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

        let merged = (y0..=y1)
            .into_par_iter()
            .map(|y| {
                let mut row_topk = TopK::new(params.topk);
                scan_row(image, tpl, y, x0, x1, params, &mut row_topk);
                row_topk
            })
            .reduce(
                || TopK::new(params.topk),
                |mut acc, row| {
                    acc.extend(row);
                    acc
                },
            );
        Ok(merged.into_sorted_desc())
    }
}
