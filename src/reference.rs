//! Reference targets: the ideal profile a mix is scored against.
//!
//! A [`Target`] carries one or both of two shapes: a fixed target with a
//! (possibly asymmetric) tolerance, or an acceptable [`Range`]. When both
//! are present and usable, the range wins — spectral bands usually have an
//! acceptable interval rather than one ideal value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::metrics::MetricKey;

/// Acceptable interval for a metric. Any value inside `[min, max]`
/// (inclusive) scores a perfect 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// A range is usable only with finite, ordered bounds. An inverted or
    /// non-finite range falls through to fixed-target scoring instead.
    pub fn is_usable(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Shortest gap from `value` to the nearer bound; 0.0 inside the range.
    pub fn distance_to(&self, value: f64) -> f64 {
        if value < self.min {
            self.min - value
        } else if value > self.max {
            value - self.max
        } else {
            0.0
        }
    }
}

/// Reference target for one metric.
///
/// `invert` marks ceiling metrics (true peak, DC offset, THD): only
/// exceeding the target is penalized, any value at or under it is perfect.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Target {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tolerance_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tolerance_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
    pub invert: bool,
}

impl Target {
    pub fn fixed(target: f64, tolerance: f64) -> Self {
        Self {
            target: Some(target),
            tolerance: Some(tolerance),
            ..Self::default()
        }
    }

    /// Ceiling metric: only penalized above `target`.
    pub fn fixed_invert(target: f64, tolerance: f64) -> Self {
        Self {
            invert: true,
            ..Self::fixed(target, tolerance)
        }
    }

    pub fn ranged(min: f64, max: f64) -> Self {
        Self {
            range: Some(Range::new(min, max)),
            ..Self::default()
        }
    }

    /// Asymmetric tolerance around a fixed target.
    pub fn fixed_asymmetric(target: f64, tolerance_min: f64, tolerance_max: f64) -> Self {
        Self {
            target: Some(target),
            tolerance_min: Some(tolerance_min),
            tolerance_max: Some(tolerance_max),
            ..Self::default()
        }
    }

    pub fn usable_range(&self) -> Option<Range> {
        self.range.filter(Range::is_usable)
    }

    pub fn usable_fixed(&self) -> Option<f64> {
        self.target.filter(|t| t.is_finite())
    }

    /// Whether this target can score anything at all. Unusable targets are
    /// excluded from scoring, never defaulted to a zero score.
    pub fn is_usable(&self) -> bool {
        self.usable_range().is_some() || self.usable_fixed().is_some()
    }
}

/// A genre reference profile: one [`Target`] per metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub targets: BTreeMap<MetricKey, Target>,
}

impl ReferenceProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            targets: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: MetricKey) -> Option<&Target> {
        self.targets.get(&key)
    }

    pub fn set(&mut self, key: MetricKey, target: Target) {
        self.targets.insert(key, target);
    }

    /// Overlay this profile on `base`: entries here win, everything else is
    /// taken from `base`. Used to fill partial genre profiles from the
    /// built-in defaults.
    pub fn merged_over(&self, base: &ReferenceProfile) -> ReferenceProfile {
        let mut targets = base.targets.clone();
        for (key, target) in &self.targets {
            targets.insert(*key, *target);
        }
        ReferenceProfile {
            name: self.name.clone().or_else(|| base.name.clone()),
            targets,
        }
    }

    /// Built-in default targets, used when a genre profile is missing or
    /// only partially specified. Tolerances are deliberately wide: these
    /// defaults describe a broadly acceptable master, not one genre's sound.
    pub fn built_in() -> ReferenceProfile {
        let mut profile = ReferenceProfile::new("default");
        profile.set(MetricKey::LufsIntegrated, Target::fixed(-14.0, 3.0));
        profile.set(MetricKey::DynamicRange, Target::fixed(10.0, 5.0));
        profile.set(MetricKey::LoudnessRange, Target::fixed(7.0, 5.0));
        profile.set(MetricKey::CrestFactor, Target::fixed(10.0, 5.0));
        profile.set(MetricKey::TruePeakDbtp, Target::fixed_invert(-1.0, 2.5));
        profile.set(MetricKey::StereoCorrelation, Target::fixed(0.3, 0.7));
        profile.set(MetricKey::StereoWidth, Target::fixed(0.6, 0.3));
        profile.set(MetricKey::BalanceLr, Target::fixed(0.0, 0.2));
        profile.set(MetricKey::SpectralCentroid, Target::fixed(2500.0, 1500.0));
        profile.set(MetricKey::SpectralFlatness, Target::fixed(0.25, 0.2));
        profile.set(MetricKey::Rolloff50, Target::fixed(3000.0, 1500.0));
        profile.set(MetricKey::Rolloff85, Target::fixed(8000.0, 3000.0));
        profile.set(MetricKey::ThdPercent, Target::fixed_invert(1.0, 1.5));
        profile.set(MetricKey::DcOffset, Target::fixed_invert(0.0, 0.03));
        profile.set(MetricKey::ClippingPct, Target::fixed_invert(0.0, 0.5));
        profile
    }
}
