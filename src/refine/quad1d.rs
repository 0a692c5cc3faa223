//! Quadratic 1D fitting for peaks sampled along a line.

/// Estimates the sub-sample peak offset for a quadratic fit.
///
/// Given samples at `t = -1, 0, +1` (`fm`, `f0`, `fp`), returns the peak
/// offset in `[-1, 1]` when the fitted parabola is concave and stable.
/// Non-finite samples (unscorable neighbours) or a flat/convex fit give `None`.
pub fn quad_peak_offset_1d(fm: f32, f0: f32, fp: f32) -> Option<f32> {
    if !fm.is_finite() || !f0.is_finite() || !fp.is_finite() {
        return None;
    }

    let denom = fm - 2.0 * f0 + fp;
    if denom.abs() < 1e-6 || denom >= 0.0 {
        return None;
    }

    let dt = 0.5 * (fm - fp) / denom;
    if dt.is_finite() && dt.abs() <= 1.0 {
        Some(dt)
    } else {
        None
    }
}
