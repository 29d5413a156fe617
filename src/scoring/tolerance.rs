//! Tolerance curves: per-metric conformity in `[0, 1]`.
//!
//! Two curves exist. Fixed-target scoring measures distance to one ideal
//! value with knees at 1x and 2x tolerance. Range scoring treats a whole
//! interval as perfect and penalizes only the overshoot, with a 0.1 floor
//! so no single band can zero out a mix on its own.

use crate::reference::Range;

/// Score a value against a fixed target.
///
/// Effective tolerance is asymmetric: `tolerance_max` applies above the
/// target, `tolerance_min` below, each falling back to the symmetric
/// `tolerance` when absent or non-positive (and that falls back to 1.0).
///
/// Non-inverted: 1.0 inside tolerance, 0.0 at double tolerance or beyond,
/// linear in between. Inverted (ceiling metrics): anything at or under the
/// target is 1.0; above it the curve passes through 0.5 at exactly one
/// tolerance and reaches 0.0 at double tolerance.
///
/// Returns `None` when `value` or `target` is non-finite — the caller must
/// skip the metric, not penalize it.
pub fn score_fixed_target(
    value: f64,
    target: f64,
    tolerance: f64,
    invert: bool,
    tolerance_min: Option<f64>,
    tolerance_max: Option<f64>,
) -> Option<f64> {
    if !value.is_finite() || !target.is_finite() {
        return None;
    }
    let tol = positive_or(tolerance, 1.0);
    let tol_min = tolerance_min
        .filter(|t| t.is_finite() && *t > 0.0)
        .unwrap_or(tol);
    let tol_max = tolerance_max
        .filter(|t| t.is_finite() && *t > 0.0)
        .unwrap_or(tol);

    let diff = value - target;
    let side_tol = if diff > 0.0 {
        tol_max
    } else if diff < 0.0 {
        tol_min
    } else {
        tol_min.max(tol_max)
    };

    if invert {
        // Ceiling metric: under the target is always perfect.
        if diff <= 0.0 {
            return Some(1.0);
        }
        if diff >= 2.0 * side_tol {
            return Some(0.0);
        }
        if diff <= side_tol {
            return Some(1.0 - (diff / side_tol) * 0.5);
        }
        return Some(1.0 - (0.5 + (diff - side_tol) / side_tol * 0.5));
    }

    let adiff = diff.abs();
    if adiff <= side_tol {
        Some(1.0)
    } else if adiff >= 2.0 * side_tol {
        Some(0.0)
    } else {
        Some(1.0 - (adiff - side_tol) / side_tol)
    }
}

/// Score a value against an acceptable interval.
///
/// Inside `[min, max]` is exactly 1.0. Outside, the score decays with the
/// distance to the nearer bound: down to 0.5 within one tolerance, 0.2 at
/// double tolerance, then asymptotically toward the 0.1 floor. The default
/// tolerance is 25% of the range width unless an override is supplied.
///
/// With no usable range, falls back to fixed-target scoring on
/// `fallback_target`; with neither, returns `None`.
pub fn score_range(
    value: f64,
    range: Option<Range>,
    fallback_target: Option<f64>,
    tolerance: Option<f64>,
) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }

    if let Some(r) = range.filter(Range::is_usable) {
        if r.contains(value) {
            return Some(1.0);
        }
        let distance = r.distance_to(value);
        let tol = effective_range_tolerance(r, tolerance);
        return Some(if distance <= tol {
            1.0 - (distance / tol) * 0.5
        } else if distance <= 2.0 * tol {
            0.5 - (distance - tol) / tol * 0.3
        } else {
            (0.2 - (distance - 2.0 * tol) / (3.0 * tol) * 0.1).max(0.1)
        });
    }

    if let Some(t) = fallback_target.filter(|t| t.is_finite()) {
        return score_fixed_target(value, t, tolerance.unwrap_or(1.0), false, None, None);
    }

    None
}

/// Near-miss tolerance for a range: caller override, or 25% of the width.
/// A degenerate zero-width range gets the same 1.0 fallback as a
/// non-positive fixed tolerance.
pub(crate) fn effective_range_tolerance(range: Range, override_tol: Option<f64>) -> f64 {
    match override_tol {
        Some(t) if t.is_finite() && t > 0.0 => t,
        _ => positive_or(range.width() * 0.25, 1.0),
    }
}

fn positive_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}
