//! Template plan precomputation for masked ZNCC.

use crate::image::ImageView;
use crate::template::Template;
use crate::util::{TrackError, TrackResult};

/// Precomputed masked statistics for ZNCC scoring.
///
/// `t_prime[i] = mask[i] * (t[i] - mean_t)` over the active pixels, so the
/// kernels can accumulate `sum(t_prime * I)` without a second mask lookup
/// for the cross term. `var_t` is the (unnormalized) masked sum of squares.
#[derive(Clone, Debug)]
pub struct MaskedTemplatePlan {
    width: usize,
    height: usize,
    sum_w: f32,
    var_t: f32,
    t_prime: Vec<f32>,
    mask: Vec<u8>,
}

impl MaskedTemplatePlan {
    /// Builds a plan for a masked template.
    pub fn from_template(tpl: &Template) -> TrackResult<Self> {
        Self::from_view_masked(tpl.view(), tpl.mask().bits())
    }

    /// Builds a plan from a template view and a row-major mask.
    pub fn from_view_masked(tpl: ImageView<'_, u8>, mask: &[u8]) -> TrackResult<Self> {
        let width = tpl.width();
        let height = tpl.height();
        let count = width
            .checked_mul(height)
            .ok_or(TrackError::InvalidMaskGeometry { width, height })?;
        if mask.len() != count {
            return Err(TrackError::ShapeMismatch {
                expected_width: width,
                expected_height: height,
                width: mask.len(),
                height: 1,
            });
        }

        let mut sum = 0.0f64;
        let mut sum_w = 0.0f64;
        for y in 0..height {
            let row = tpl.row(y).ok_or(TrackError::BufferTooSmall {
                needed: (y + 1) * tpl.stride(),
                got: tpl.as_slice().len(),
            })?;
            for (x, &value) in row.iter().enumerate() {
                if mask[y * width + x] != 0 {
                    sum += f64::from(value);
                    sum_w += 1.0;
                }
            }
        }
        if sum_w < 2.0 {
            return Err(TrackError::DegenerateTemplate {
                reason: "mask has fewer than two active pixels",
            });
        }

        let mean = sum / sum_w;
        let mut var_t = 0.0f64;
        let mut t_prime = Vec::with_capacity(count);
        let mut bits = Vec::with_capacity(count);
        for y in 0..height {
            let row = tpl.row(y).ok_or(TrackError::BufferTooSmall {
                needed: (y + 1) * tpl.stride(),
                got: tpl.as_slice().len(),
            })?;
            for (x, &value) in row.iter().enumerate() {
                if mask[y * width + x] != 0 {
                    let d = f64::from(value) - mean;
                    var_t += d * d;
                    t_prime.push(d as f32);
                    bits.push(1);
                } else {
                    t_prime.push(0.0);
                    bits.push(0);
                }
            }
        }
        if var_t <= 1e-8 {
            return Err(TrackError::DegenerateTemplate {
                reason: "zero variance",
            });
        }

        Ok(Self {
            width,
            height,
            sum_w: sum_w as f32,
            var_t: var_t as f32,
            t_prime,
            mask: bits,
        })
    }

    /// Returns the template width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the template height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of active mask pixels.
    pub fn sum_w(&self) -> f32 {
        self.sum_w
    }

    /// Masked sum of squared deviations of the template.
    pub fn var_t(&self) -> f32 {
        self.var_t
    }

    /// Masked zero-mean template values, row-major.
    pub fn t_prime(&self) -> &[f32] {
        &self.t_prime
    }

    /// Mask bits (`0` or `1`), row-major.
    pub fn mask(&self) -> &[u8] {
        &self.mask
    }
}
