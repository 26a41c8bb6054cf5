//! Automation curve evaluation.
//!
//! A curve maps progress `p` in [0, 1] to a value between its start and
//! end. Evaluation is a pure function; callers decide the resolution
//! (per sample for amplitude and frequency, per 64-sample block for filter
//! coefficients).

use spa_doc::{Curve, CurveKind, Param};

/// Evaluates a curve at progress `p`.
pub fn curve_value(curve: &Curve, p: f64) -> f64 {
    let (s, e) = (curve.start, curve.end);
    match curve.kind {
        CurveKind::Linear => s + (e - s) * p,
        CurveKind::Exp => {
            // An exponential sweep cannot leave zero; nudge the start.
            let s = if s == 0.0 { 1e-3 } else { s };
            s * (e / s).powf(p)
        }
        CurveKind::Log => s + (e - s) * (1.0 + 9.0 * p).log10(),
        CurveKind::Smooth => s + (e - s) * (p * p * (3.0 - 2.0 * p)),
        CurveKind::EaseIn => s + (e - s) * p * p,
        CurveKind::EaseOut => s + (e - s) * (1.0 - (1.0 - p) * (1.0 - p)),
        CurveKind::Step => {
            if p < 0.5 {
                s
            } else {
                e
            }
        }
    }
}

/// Evaluates a scalar-or-curve parameter at progress `p`.
pub fn param_value(param: &Param, p: f64) -> f64 {
    match param {
        Param::Scalar(v) => *v,
        Param::Curve(curve) => curve_value(curve, p),
    }
}

/// Progress of sample `i` in a buffer of `total` samples.
#[inline]
pub fn progress(i: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        i as f64 / total as f64
    }
}
