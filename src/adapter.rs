//! Boundary adapter for upstream metric producers.
//!
//! Older analysis pipelines emit several spellings for the same metric
//! (`dr` / `dr_stat` / `dynamicRange`), split DC offset per channel, and
//! describe genre references as a flat field list (`lufs_target`,
//! `tol_lufs`, `bands.sub.target_db`, …). All of that is resolved here, at
//! the edge, so the scoring core only ever sees canonical [`MetricKey`]s
//! and typed [`ReferenceProfile`]s.

use std::collections::HashMap;

use serde::Deserialize;

use crate::metrics::{BandId, MetricKey, MetricSet};
use crate::reference::{Range, ReferenceProfile, Target};

/// Resolve a raw producer key to its canonical metric. Tries the canonical
/// spelling first, then the known legacy aliases.
pub fn resolve_key(raw: &str) -> Option<MetricKey> {
    if let Ok(key) = raw.parse::<MetricKey>() {
        return Some(key);
    }
    Some(match raw {
        "lufs_integrated" => MetricKey::LufsIntegrated,
        "true_peak_dbtp" | "truePeak" => MetricKey::TruePeakDbtp,
        "dr_stat" | "dynamicRange" | "dynamic_range" | "tt_dr" => MetricKey::DynamicRange,
        "loudness_range" => MetricKey::LoudnessRange,
        "crest_factor" => MetricKey::CrestFactor,
        "stereo_correlation" => MetricKey::StereoCorrelation,
        "stereo_width" => MetricKey::StereoWidth,
        "balance_lr" | "balanceLr" => MetricKey::BalanceLr,
        "spectralCentroid" | "spectral_centroid" => MetricKey::SpectralCentroid,
        "spectral_flatness" => MetricKey::SpectralFlatness,
        "spectralRolloff50" | "spectral_rolloff_50" => MetricKey::Rolloff50,
        "spectralRolloff85" | "spectral_rolloff_85" => MetricKey::Rolloff85,
        "thd_percent" => MetricKey::ThdPercent,
        "dc_offset" => MetricKey::DcOffset,
        "clipping_pct" => MetricKey::ClippingPct,
        _ => return None,
    })
}

/// Convert a raw key→value map into a canonical [`MetricSet`].
///
/// Canonical spellings win over aliases when a producer sends both. Split
/// per-channel DC offsets (`dcOffsetLeft` / `dcOffsetRight`) merge as
/// `max(|left|, |right|)` unless a combined `dcOffset` is present, which is
/// taken as `|dcOffset|`. Unknown keys are logged at debug and dropped.
pub fn normalize(raw: &HashMap<String, f64>) -> MetricSet {
    let mut set = MetricSet::new();

    // Canonical spellings first, so an alias can never shadow one
    for (key, &value) in raw {
        if let Ok(canonical) = key.parse::<MetricKey>() {
            set.insert(canonical, value);
        }
    }
    for (key, &value) in raw {
        if key.parse::<MetricKey>().is_ok() {
            continue;
        }
        match resolve_key(key) {
            Some(canonical) => {
                if !set.contains(canonical) {
                    set.insert(canonical, value);
                }
            }
            None if key == "dcOffsetLeft" || key == "dcOffsetRight" => {}
            None => log::debug!("dropping unknown metric key: {key}"),
        }
    }

    if !set.contains(MetricKey::DcOffset) {
        let left = raw.get("dcOffsetLeft").copied();
        let right = raw.get("dcOffsetRight").copied();
        if left.is_some() || right.is_some() {
            let combined = left.unwrap_or(0.0).abs().max(right.unwrap_or(0.0).abs());
            if combined.is_finite() {
                set.insert(MetricKey::DcOffset, combined);
            }
        }
    } else if let Some(dc) = set.get(MetricKey::DcOffset) {
        set.insert(MetricKey::DcOffset, dc.abs());
    }

    set
}

/// Flat legacy genre reference shape, as emitted by the genre JSON files.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LegacyReference {
    pub lufs_target: Option<f64>,
    pub tol_lufs: Option<f64>,
    pub tol_lufs_min: Option<f64>,
    pub tol_lufs_max: Option<f64>,
    pub true_peak_target: Option<f64>,
    pub tol_true_peak: Option<f64>,
    pub dr_target: Option<f64>,
    pub tol_dr: Option<f64>,
    pub lra_target: Option<f64>,
    pub tol_lra: Option<f64>,
    pub stereo_target: Option<f64>,
    pub tol_stereo: Option<f64>,
    pub bands: HashMap<String, LegacyBand>,
}

/// Legacy per-band reference entry. `target_range` wins over `target_db`
/// when both are present and the range is usable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LegacyBand {
    pub target_db: Option<f64>,
    pub tol_db: Option<f64>,
    pub tol_min: Option<f64>,
    pub tol_max: Option<f64>,
    pub target_range: Option<Range>,
}

/// Build a [`ReferenceProfile`] from the legacy flat shape, overlaid on the
/// built-in defaults — the historical behavior was per-field fallback to
/// the default table, and a partial genre file must keep scoring every
/// metric.
pub fn reference_from_legacy(legacy: &LegacyReference) -> ReferenceProfile {
    let mut profile = ReferenceProfile::default();

    if let Some(target) = legacy.lufs_target {
        profile.set(
            MetricKey::LufsIntegrated,
            Target {
                target: Some(target),
                tolerance: legacy.tol_lufs,
                tolerance_min: legacy.tol_lufs_min,
                tolerance_max: legacy.tol_lufs_max,
                ..Target::default()
            },
        );
    }
    if let Some(target) = legacy.true_peak_target {
        profile.set(
            MetricKey::TruePeakDbtp,
            Target {
                invert: true,
                ..Target::fixed(target, legacy.tol_true_peak.unwrap_or(2.5))
            },
        );
    }
    if let Some(target) = legacy.dr_target {
        profile.set(
            MetricKey::DynamicRange,
            Target::fixed(target, legacy.tol_dr.unwrap_or(5.0)),
        );
    }
    if let Some(target) = legacy.lra_target {
        profile.set(
            MetricKey::LoudnessRange,
            Target::fixed(target, legacy.tol_lra.unwrap_or(5.0)),
        );
    }
    if let Some(target) = legacy.stereo_target {
        profile.set(
            MetricKey::StereoCorrelation,
            Target::fixed(target, legacy.tol_stereo.unwrap_or(0.7)),
        );
    }

    for (name, band) in &legacy.bands {
        let Some(band_id) = BandId::from_name(name) else {
            log::debug!("dropping unknown band in legacy reference: {name}");
            continue;
        };
        if let Some(target) = legacy_band_target(band) {
            profile.set(MetricKey::Band(band_id), target);
        }
    }

    profile.merged_over(&ReferenceProfile::built_in())
}

fn legacy_band_target(band: &LegacyBand) -> Option<Target> {
    if let Some(range) = band.target_range.filter(Range::is_usable) {
        return Some(Target {
            range: Some(range),
            tolerance: band.tol_db,
            ..Target::default()
        });
    }
    let target_db = band.target_db.filter(|t| t.is_finite())?;
    // Historical tolerance: average of the asymmetric pair when present,
    // otherwise tol_db
    let tol_min = band.tol_min.or(band.tol_db);
    let tol_max = band.tol_max.or(band.tol_db);
    let tolerance = match (tol_min, tol_max) {
        (Some(lo), Some(hi)) => Some((lo + hi) / 2.0),
        _ => band.tol_db,
    };
    Some(Target {
        target: Some(target_db),
        tolerance,
        tolerance_min: band.tol_min,
        tolerance_max: band.tol_max,
        ..Target::default()
    })
}
