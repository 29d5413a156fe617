//! Canonical metric identifiers and the measured-value container.
//!
//! Upstream analysis pipelines historically emitted several spellings for
//! the same metric; those aliases are resolved in [`crate::adapter`], so
//! everything past that boundary works with one `MetricKey` per metric.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Informational grouping of metrics for UI display. Not weighted — every
/// scored metric contributes equally to the final percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Loudness,
    Dynamics,
    Peak,
    Stereo,
    Tonal,
    Spectral,
    Technical,
}

/// Spectral band identifiers, matching the band layout of the genre
/// reference datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BandId {
    Sub,
    LowBass,
    UpperBass,
    LowMid,
    Mid,
    HighMid,
    Brilho,
    Presenca,
}

impl BandId {
    pub const ALL: [BandId; 8] = [
        BandId::Sub,
        BandId::LowBass,
        BandId::UpperBass,
        BandId::LowMid,
        BandId::Mid,
        BandId::HighMid,
        BandId::Brilho,
        BandId::Presenca,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BandId::Sub => "sub",
            BandId::LowBass => "low_bass",
            BandId::UpperBass => "upper_bass",
            BandId::LowMid => "low_mid",
            BandId::Mid => "mid",
            BandId::HighMid => "high_mid",
            BandId::Brilho => "brilho",
            BandId::Presenca => "presenca",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        BandId::ALL.iter().copied().find(|b| b.name() == name)
    }
}

/// Canonical metric identifiers.
///
/// Declaration order is the evaluation order used by
/// [`crate::scoring::compute_score`], so results are deterministic and
/// bit-identical for identical input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetricKey {
    LufsIntegrated,
    DynamicRange,
    LoudnessRange,
    CrestFactor,
    TruePeakDbtp,
    StereoCorrelation,
    StereoWidth,
    BalanceLr,
    Band(BandId),
    SpectralCentroid,
    SpectralFlatness,
    Rolloff50,
    Rolloff85,
    ThdPercent,
    DcOffset,
    ClippingPct,
}

impl MetricKey {
    /// All non-band keys, in evaluation order. Band keys are enumerated
    /// separately via [`BandId::ALL`].
    pub const SCALARS: [MetricKey; 15] = [
        MetricKey::LufsIntegrated,
        MetricKey::DynamicRange,
        MetricKey::LoudnessRange,
        MetricKey::CrestFactor,
        MetricKey::TruePeakDbtp,
        MetricKey::StereoCorrelation,
        MetricKey::StereoWidth,
        MetricKey::BalanceLr,
        MetricKey::SpectralCentroid,
        MetricKey::SpectralFlatness,
        MetricKey::Rolloff50,
        MetricKey::Rolloff85,
        MetricKey::ThdPercent,
        MetricKey::DcOffset,
        MetricKey::ClippingPct,
    ];

    pub fn category(self) -> Category {
        match self {
            MetricKey::LufsIntegrated => Category::Loudness,
            MetricKey::DynamicRange
            | MetricKey::LoudnessRange
            | MetricKey::CrestFactor => Category::Dynamics,
            MetricKey::TruePeakDbtp => Category::Peak,
            MetricKey::StereoCorrelation
            | MetricKey::StereoWidth
            | MetricKey::BalanceLr => Category::Stereo,
            MetricKey::Band(_) => Category::Tonal,
            MetricKey::SpectralCentroid
            | MetricKey::SpectralFlatness
            | MetricKey::Rolloff50
            | MetricKey::Rolloff85 => Category::Spectral,
            MetricKey::ThdPercent | MetricKey::DcOffset | MetricKey::ClippingPct => {
                Category::Technical
            }
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKey::LufsIntegrated => f.write_str("lufsIntegrated"),
            MetricKey::DynamicRange => f.write_str("dr"),
            MetricKey::LoudnessRange => f.write_str("lra"),
            MetricKey::CrestFactor => f.write_str("crestFactor"),
            MetricKey::TruePeakDbtp => f.write_str("truePeakDbtp"),
            MetricKey::StereoCorrelation => f.write_str("stereoCorrelation"),
            MetricKey::StereoWidth => f.write_str("stereoWidth"),
            MetricKey::BalanceLr => f.write_str("balanceLR"),
            MetricKey::Band(b) => write!(f, "band_{}", b.name()),
            MetricKey::SpectralCentroid => f.write_str("centroid"),
            MetricKey::SpectralFlatness => f.write_str("spectralFlatness"),
            MetricKey::Rolloff50 => f.write_str("rolloff50"),
            MetricKey::Rolloff85 => f.write_str("rolloff85"),
            MetricKey::ThdPercent => f.write_str("thdPercent"),
            MetricKey::DcOffset => f.write_str("dcOffset"),
            MetricKey::ClippingPct => f.write_str("clippingPct"),
        }
    }
}

/// Error for a key that is not a canonical metric name. Aliases from older
/// producers are deliberately rejected here — see [`crate::adapter`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown metric key: {0}")]
pub struct UnknownMetric(pub String);

impl FromStr for MetricKey {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(band) = s.strip_prefix("band_").and_then(BandId::from_name) {
            return Ok(MetricKey::Band(band));
        }
        match s {
            "lufsIntegrated" => Ok(MetricKey::LufsIntegrated),
            "dr" => Ok(MetricKey::DynamicRange),
            "lra" => Ok(MetricKey::LoudnessRange),
            "crestFactor" => Ok(MetricKey::CrestFactor),
            "truePeakDbtp" => Ok(MetricKey::TruePeakDbtp),
            "stereoCorrelation" => Ok(MetricKey::StereoCorrelation),
            "stereoWidth" => Ok(MetricKey::StereoWidth),
            "balanceLR" => Ok(MetricKey::BalanceLr),
            "centroid" => Ok(MetricKey::SpectralCentroid),
            "spectralFlatness" => Ok(MetricKey::SpectralFlatness),
            "rolloff50" => Ok(MetricKey::Rolloff50),
            "rolloff85" => Ok(MetricKey::Rolloff85),
            "thdPercent" => Ok(MetricKey::ThdPercent),
            "dcOffset" => Ok(MetricKey::DcOffset),
            "clippingPct" => Ok(MetricKey::ClippingPct),
            _ => Err(UnknownMetric(s.to_string())),
        }
    }
}

impl Serialize for MetricKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MetricKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Measured metric values for one analyzed track.
///
/// Non-finite values are accepted on insert and skipped at scoring time —
/// a missing or NaN measurement is a data gap, never a zero score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSet {
    values: BTreeMap<MetricKey, f64>,
}

impl MetricSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: MetricKey, value: f64) {
        self.values.insert(key, value);
    }

    pub fn get(&self, key: MetricKey) -> Option<f64> {
        self.values.get(&key).copied()
    }

    pub fn contains(&self, key: MetricKey) -> bool {
        self.values.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate in canonical evaluation order (see [`MetricKey`]).
    pub fn iter(&self) -> impl Iterator<Item = (MetricKey, f64)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }
}

impl FromIterator<(MetricKey, f64)> for MetricSet {
    fn from_iter<T: IntoIterator<Item = (MetricKey, f64)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_parse_round_trip() {
        for key in MetricKey::SCALARS {
            let name = key.to_string();
            assert_eq!(name.parse::<MetricKey>(), Ok(key), "key {name}");
        }
        for band in BandId::ALL {
            let key = MetricKey::Band(band);
            assert_eq!(key.to_string().parse::<MetricKey>(), Ok(key));
        }
    }

    #[test]
    fn test_parse_rejects_aliases() {
        // Legacy spellings belong to the adapter, not the canonical parser
        assert!("lufs_integrated".parse::<MetricKey>().is_err());
        assert!("dr_stat".parse::<MetricKey>().is_err());
        assert!("band_bogus".parse::<MetricKey>().is_err());
        assert!("".parse::<MetricKey>().is_err());
    }

    #[test]
    fn test_band_names() {
        assert_eq!(BandId::Sub.name(), "sub");
        assert_eq!(BandId::from_name("high_mid"), Some(BandId::HighMid));
        assert_eq!(BandId::from_name("treble"), None);
        assert_eq!(MetricKey::Band(BandId::Presenca).to_string(), "band_presenca");
    }

    #[test]
    fn test_categories() {
        assert_eq!(MetricKey::LufsIntegrated.category(), Category::Loudness);
        assert_eq!(MetricKey::TruePeakDbtp.category(), Category::Peak);
        assert_eq!(MetricKey::Band(BandId::Mid).category(), Category::Tonal);
        assert_eq!(MetricKey::DcOffset.category(), Category::Technical);
    }

    #[test]
    fn test_metric_set_iteration_order() {
        let mut set = MetricSet::new();
        set.insert(MetricKey::DcOffset, 0.01);
        set.insert(MetricKey::LufsIntegrated, -14.0);
        set.insert(MetricKey::Band(BandId::Sub), -28.0);

        let keys: Vec<MetricKey> = set.iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![
                MetricKey::LufsIntegrated,
                MetricKey::Band(BandId::Sub),
                MetricKey::DcOffset,
            ]
        );
    }

    #[test]
    fn test_metric_set_accepts_non_finite() {
        let mut set = MetricSet::new();
        set.insert(MetricKey::LoudnessRange, f64::NAN);
        assert!(set.contains(MetricKey::LoudnessRange));
        assert!(set.get(MetricKey::LoudnessRange).unwrap().is_nan());
    }

    #[test]
    fn test_serde_key_as_string() {
        let json = serde_json::to_string(&MetricKey::TruePeakDbtp).unwrap();
        assert_eq!(json, "\"truePeakDbtp\"");
        let back: MetricKey = serde_json::from_str("\"band_sub\"").unwrap();
        assert_eq!(back, MetricKey::Band(BandId::Sub));
    }
}
