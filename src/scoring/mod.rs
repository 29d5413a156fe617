//! Equal-weight mix conformity scoring.
//!
//! Every metric with a finite measurement and a usable reference target is
//! scored in `[0, 1]` by its tolerance curve; the aggregate percentage is
//! the plain mean across those metrics. Metrics that cannot be scored are
//! skipped entirely — they never count toward the denominator and never
//! produce a zero. With nothing scoreable at all, the result is a fixed
//! 50% / Básico fallback: absence of data must not read as a terrible mix.

pub mod classify;
pub mod tolerance;

use serde::Serialize;

use crate::metrics::{Category, MetricKey, MetricSet};
use crate::reference::{Range, ReferenceProfile, Target};
use classify::{Classification, Severity, Status};
use tolerance::{effective_range_tolerance, score_fixed_target, score_range};

/// Which tolerance curve scored a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMethod {
    Range,
    FixedTarget,
}

/// One metric's conformity verdict: numeric score for aggregation plus
/// status/severity for UI highlighting and downstream suggestions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredMetric {
    pub key: MetricKey,
    pub category: Category,
    pub value: f64,
    /// Fixed target, or the range midpoint for display purposes.
    pub target: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
    /// Conformity in `[0, 1]`; 1.0 is perfect.
    pub score: f64,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    /// Distance-to-tolerance ratio; 0.0 when the status is OK.
    pub deviation_ratio: f64,
    pub method: ScoringMethod,
}

/// Aggregate scoring result. Always a valid value — degenerate input maps
/// to the no-data fallback, never to an error or a zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    /// 0–100, rounded to one decimal place.
    pub percentage: f64,
    pub classification: Classification,
    /// Per-metric breakdown in evaluation order.
    pub metrics: Vec<ScoredMetric>,
    pub metric_count: usize,
    /// Diagnostic: 100 / metric_count (100.0 for the no-data fallback).
    pub equal_weight: f64,
}

/// Percentage reported when nothing could be scored.
pub const NO_DATA_PERCENTAGE: f64 = 50.0;

/// Score a set of measurements against a reference profile.
///
/// Range targets take priority over fixed targets when a reference entry
/// carries both. Per-metric failures are absorbed by skipping; this
/// function never fails.
pub fn compute_score(measured: &MetricSet, reference: &ReferenceProfile) -> ScoreResult {
    let mut metrics: Vec<ScoredMetric> = Vec::with_capacity(measured.len());

    for (key, value) in measured.iter() {
        let Some(target) = reference.get(key) else {
            log::debug!("no reference target for {key}, skipping");
            continue;
        };
        match score_metric(key, value, target) {
            Some(scored) => {
                log::debug!(
                    "{key}: value={value} score={:.3} status={:?}",
                    scored.score,
                    scored.status
                );
                metrics.push(scored);
            }
            None => log::debug!("{key}: unscoreable (non-finite value or unusable target)"),
        }
    }

    if metrics.is_empty() {
        log::warn!("no scoreable metrics, using {NO_DATA_PERCENTAGE}% fallback");
        return ScoreResult {
            percentage: NO_DATA_PERCENTAGE,
            classification: Classification::from_percentage(NO_DATA_PERCENTAGE),
            metrics,
            metric_count: 0,
            equal_weight: 100.0,
        };
    }

    let count = metrics.len();
    let mean = metrics.iter().map(|m| m.score).sum::<f64>() / count as f64;
    let percentage = round_to(mean * 100.0, 1);

    ScoreResult {
        percentage,
        classification: Classification::from_percentage(percentage),
        metrics,
        metric_count: count,
        equal_weight: round_to(100.0 / count as f64, 2),
    }
}

/// Score one metric, deriving status/severity from the same
/// distance/tolerance inputs as the numeric score.
fn score_metric(key: MetricKey, value: f64, target: &Target) -> Option<ScoredMetric> {
    if !value.is_finite() {
        return None;
    }

    if let Some(range) = target.usable_range() {
        let score = score_range(value, Some(range), target.target, target.tolerance)?;
        let (status, ratio) = range_status(value, range, target.tolerance);
        return Some(ScoredMetric {
            key,
            category: key.category(),
            value,
            target: target.target.or(Some(range.midpoint())),
            range: Some(range),
            score: clamp01(score),
            status,
            severity: (status != Status::Ok).then(|| Severity::from_ratio(ratio)),
            deviation_ratio: ratio,
            method: ScoringMethod::Range,
        });
    }

    let fixed = target.usable_fixed()?;
    let score = score_fixed_target(
        value,
        fixed,
        target.tolerance.unwrap_or(f64::NAN),
        target.invert,
        target.tolerance_min,
        target.tolerance_max,
    )?;
    let (status, ratio) = fixed_status(value, fixed, target);
    Some(ScoredMetric {
        key,
        category: key.category(),
        value,
        target: Some(fixed),
        range: None,
        score: clamp01(score),
        status,
        severity: (status != Status::Ok).then(|| Severity::from_ratio(ratio)),
        deviation_ratio: ratio,
        method: ScoringMethod::FixedTarget,
    })
}

fn range_status(value: f64, range: Range, override_tol: Option<f64>) -> (Status, f64) {
    if range.contains(value) {
        return (Status::Ok, 0.0);
    }
    let tol = effective_range_tolerance(range, override_tol);
    if value < range.min {
        (Status::Below, (range.min - value) / tol)
    } else {
        (Status::Above, (value - range.max) / tol)
    }
}

fn fixed_status(value: f64, fixed: f64, target: &Target) -> (Status, f64) {
    let tol = target
        .tolerance
        .filter(|t| t.is_finite() && *t > 0.0)
        .unwrap_or(1.0);
    let tol_min = target
        .tolerance_min
        .filter(|t| t.is_finite() && *t > 0.0)
        .unwrap_or(tol);
    let tol_max = target
        .tolerance_max
        .filter(|t| t.is_finite() && *t > 0.0)
        .unwrap_or(tol);

    let diff = value - fixed;
    let status = if target.invert {
        // Ceiling metric: under the target can never miss
        if diff > tol_max { Status::Above } else { Status::Ok }
    } else if diff < -tol_min {
        Status::Below
    } else if diff > tol_max {
        Status::Above
    } else {
        Status::Ok
    };

    if status == Status::Ok {
        (status, 0.0)
    } else {
        let side_tol = if diff > 0.0 { tol_max } else { tol_min };
        (status, diff.abs() / side_tol)
    }
}

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

pub(crate) fn round_to(x: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (x * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::BandId;

    fn measured(entries: &[(MetricKey, f64)]) -> MetricSet {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_no_data_fallback() {
        let _ = env_logger::builder().is_test(true).try_init();
        let result = compute_score(&MetricSet::new(), &ReferenceProfile::built_in());
        assert_eq!(result.percentage, 50.0);
        assert_eq!(result.classification, Classification::Basico);
        assert_eq!(result.metric_count, 0);
        assert_eq!(result.equal_weight, 100.0);
        assert!(result.metrics.is_empty());
    }

    #[test]
    fn test_all_non_finite_is_no_data() {
        let set = measured(&[
            (MetricKey::LufsIntegrated, f64::NAN),
            (MetricKey::DynamicRange, f64::NEG_INFINITY),
        ]);
        let result = compute_score(&set, &ReferenceProfile::built_in());
        assert_eq!(result.percentage, 50.0);
        assert_eq!(result.metric_count, 0);
    }

    #[test]
    fn test_missing_reference_is_skipped_not_zeroed() {
        let mut reference = ReferenceProfile::new("minimal");
        reference.set(MetricKey::LufsIntegrated, Target::fixed(-14.0, 3.0));

        // stereoWidth has no target in this profile: excluded from denominator
        let set = measured(&[
            (MetricKey::LufsIntegrated, -14.0),
            (MetricKey::StereoWidth, 0.9),
        ]);
        let result = compute_score(&set, &reference);
        assert_eq!(result.metric_count, 1);
        assert_eq!(result.percentage, 100.0);
    }

    #[test]
    fn test_unusable_target_is_skipped() {
        let mut reference = ReferenceProfile::new("broken");
        reference.set(MetricKey::LufsIntegrated, Target::default());
        reference.set(MetricKey::DynamicRange, Target::fixed(10.0, 5.0));

        let set = measured(&[
            (MetricKey::LufsIntegrated, -14.0),
            (MetricKey::DynamicRange, 10.0),
        ]);
        let result = compute_score(&set, &reference);
        assert_eq!(result.metric_count, 1);
        assert_eq!(result.metrics[0].key, MetricKey::DynamicRange);
    }

    #[test]
    fn test_equal_weight_example() {
        // Two metrics at 1.0 and one at 0.4 → mean 0.8 → 80.0%, Avançado
        let mut reference = ReferenceProfile::new("t");
        reference.set(MetricKey::LufsIntegrated, Target::fixed(-14.0, 3.0));
        reference.set(MetricKey::DynamicRange, Target::fixed(10.0, 5.0));
        // crestFactor at 18: adiff 8 with tol 5 → 1 - 3/5 = 0.4
        reference.set(MetricKey::CrestFactor, Target::fixed(10.0, 5.0));

        let set = measured(&[
            (MetricKey::LufsIntegrated, -14.0),
            (MetricKey::DynamicRange, 10.0),
            (MetricKey::CrestFactor, 18.0),
        ]);
        let result = compute_score(&set, &reference);
        assert_eq!(result.metric_count, 3);
        assert_eq!(result.percentage, 80.0);
        assert_eq!(result.classification, Classification::Avancado);
        assert_eq!(result.equal_weight, 33.33);
    }

    #[test]
    fn test_range_takes_priority_over_fixed() {
        let mut reference = ReferenceProfile::new("t");
        let mut target = Target::ranged(-34.0, -22.0);
        // Fixed shape present too, and it would score this value 0.0
        target.target = Some(-50.0);
        target.tolerance = Some(1.0);
        reference.set(MetricKey::Band(BandId::Sub), target);

        let set = measured(&[(MetricKey::Band(BandId::Sub), -28.0)]);
        let result = compute_score(&set, &reference);
        assert_eq!(result.metrics[0].method, ScoringMethod::Range);
        assert_eq!(result.metrics[0].score, 1.0);
        assert_eq!(result.percentage, 100.0);
    }

    #[test]
    fn test_status_and_severity_fixed() {
        let mut reference = ReferenceProfile::new("t");
        reference.set(MetricKey::LufsIntegrated, Target::fixed(-14.0, 2.0));

        // 3 dB under target with tol 2 → Below, n = 1.5, moderate
        let set = measured(&[(MetricKey::LufsIntegrated, -17.0)]);
        let result = compute_score(&set, &reference);
        let m = &result.metrics[0];
        assert_eq!(m.status, Status::Below);
        assert_eq!(m.severity, Some(Severity::Moderate));
        assert!((m.deviation_ratio - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_status_and_severity_range() {
        let mut reference = ReferenceProfile::new("t");
        reference.set(MetricKey::Band(BandId::Sub), Target::ranged(-34.0, -22.0));

        // 9 dB over the max with tolerance 3 → Above, n = 3, severe
        let set = measured(&[(MetricKey::Band(BandId::Sub), -13.0)]);
        let result = compute_score(&set, &reference);
        let m = &result.metrics[0];
        assert_eq!(m.status, Status::Above);
        assert_eq!(m.severity, Some(Severity::Severe));
        assert!((m.deviation_ratio - 3.0).abs() < 1e-9);
        // Display target is the range midpoint
        assert_eq!(m.target, Some(-28.0));
    }

    #[test]
    fn test_invert_only_above_reachable() {
        let mut reference = ReferenceProfile::new("t");
        reference.set(MetricKey::TruePeakDbtp, Target::fixed_invert(-1.0, 1.0));

        // Way under the ceiling: OK, perfect
        let set = measured(&[(MetricKey::TruePeakDbtp, -20.0)]);
        let result = compute_score(&set, &reference);
        assert_eq!(result.metrics[0].status, Status::Ok);
        assert_eq!(result.metrics[0].score, 1.0);

        // Over the ceiling: Above
        let set = measured(&[(MetricKey::TruePeakDbtp, 0.5)]);
        let result = compute_score(&set, &reference);
        assert_eq!(result.metrics[0].status, Status::Above);
        assert_eq!(result.metrics[0].severity, Some(Severity::Moderate));
    }

    #[test]
    fn test_evaluation_order_is_canonical() {
        let reference = ReferenceProfile::built_in();
        let set = measured(&[
            (MetricKey::DcOffset, 0.0),
            (MetricKey::LufsIntegrated, -14.0),
            (MetricKey::TruePeakDbtp, -2.0),
        ]);
        let result = compute_score(&set, &reference);
        let keys: Vec<MetricKey> = result.metrics.iter().map(|m| m.key).collect();
        assert_eq!(
            keys,
            vec![
                MetricKey::LufsIntegrated,
                MetricKey::TruePeakDbtp,
                MetricKey::DcOffset,
            ]
        );
    }

    #[test]
    fn test_idempotence() {
        let mut reference = ReferenceProfile::built_in();
        reference.set(MetricKey::Band(BandId::HighMid), Target::ranged(-30.0, -18.0));
        let set = measured(&[
            (MetricKey::LufsIntegrated, -11.3),
            (MetricKey::TruePeakDbtp, -0.2),
            (MetricKey::DynamicRange, 6.8),
            (MetricKey::Band(BandId::HighMid), -16.4),
        ]);
        let first = compute_score(&set, &reference);
        let second = compute_score(&set, &reference);
        assert_eq!(first, second);
    }

    #[test]
    fn test_percentage_one_decimal() {
        // Single metric scoring 2/3 → 66.666… rounds to 66.7
        let mut reference = ReferenceProfile::new("t");
        reference.set(MetricKey::DynamicRange, Target::fixed(10.0, 3.0));
        // adiff 4 with tol 3 → 1 - 1/3 = 0.666…
        let set = measured(&[(MetricKey::DynamicRange, 14.0)]);
        let result = compute_score(&set, &reference);
        assert_eq!(result.percentage, 66.7);
        assert_eq!(result.classification, Classification::Intermediario);
    }

    #[test]
    fn test_result_serializes_with_labels() {
        let mut reference = ReferenceProfile::new("t");
        reference.set(MetricKey::LufsIntegrated, Target::fixed(-14.0, 3.0));
        let set = measured(&[(MetricKey::LufsIntegrated, -14.0)]);
        let result = compute_score(&set, &reference);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["classification"], "Referência Mundial");
        assert_eq!(json["metrics"][0]["key"], "lufsIntegrated");
        assert_eq!(json["metrics"][0]["status"], "OK");
    }
}
