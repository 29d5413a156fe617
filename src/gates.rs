//! Critical post-scoring gates.
//!
//! `compute_score` rates conformity to a genre profile, but a good average
//! must not buy back hard delivery faults: digital clipping, true peak over
//! the mode ceiling, loudness-war LUFS. Gates cap the final percentage
//! proportionally to the excess and can escalate the verdict past the
//! normal quality bands. They run as a separate pass so the base scoring
//! contract stays untouched.

use std::fmt;

use serde::Serialize;

use crate::metrics::{MetricKey, MetricSet};
use crate::scoring::classify::Classification;
use crate::scoring::{round_to, ScoreResult};

/// Delivery mode, selecting the true-peak and LUFS ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Streaming,
    Club,
    Reference,
}

struct ModeLimits {
    true_peak_max: f64,
    lufs_max: f64,
}

impl Mode {
    fn limits(self) -> ModeLimits {
        match self {
            Mode::Streaming => ModeLimits {
                true_peak_max: -1.0,
                lufs_max: -12.0,
            },
            Mode::Club => ModeLimits {
                true_peak_max: 0.0,
                lufs_max: -6.0,
            },
            Mode::Reference => ModeLimits {
                true_peak_max: 0.0,
                lufs_max: -8.0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateKind {
    TruePeak,
    Clipping,
    Loudness,
    DcOffset,
}

/// One triggered gate. `cap` is the percentage ceiling it imposes; the DC
/// offset gate applies a flat 10-point penalty instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gate {
    pub kind: GateKind,
    pub value: f64,
    pub limit: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cap: Option<f64>,
}

/// Final verdict after gates. The two non-quality verdicts are only
/// reachable through gates: a true peak above 0 dBTP is unacceptable
/// outright, large excesses need fixing before the quality bands apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Quality(Classification),
    NeedsFixes,
    Unacceptable,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Quality(c) => f.write_str(c.label()),
            Verdict::NeedsFixes => f.write_str("Necessita Correções"),
            Verdict::Unacceptable => f.write_str("Inaceitável"),
        }
    }
}

/// Score result after gate application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatedResult {
    /// Final percentage, capped and penalized.
    pub percentage: f64,
    /// The base percentage before gates, for transparency in the UI.
    pub raw_percentage: f64,
    pub verdict: Verdict,
    pub gates: Vec<Gate>,
    pub mode: Mode,
}

impl GatedResult {
    pub fn was_penalized(&self) -> bool {
        self.percentage < self.raw_percentage
    }
}

/// Apply the critical gates for `mode` to a base score.
///
/// Gate inputs come from the measurements, not the scored metrics: a gate
/// must fire even when the offending metric had no reference target and was
/// skipped by scoring.
pub fn apply_gates(result: &ScoreResult, measured: &MetricSet, mode: Mode) -> GatedResult {
    let limits = mode.limits();
    let mut gates: Vec<Gate> = Vec::new();
    let mut cap = 100.0f64;
    let mut unacceptable = false;
    let mut needs_fixes = false;

    let finite = |key: MetricKey| measured.get(key).filter(|v| v.is_finite());

    if let Some(tp) = finite(MetricKey::TruePeakDbtp) {
        if tp > limits.true_peak_max {
            let excess = tp - limits.true_peak_max;
            let tp_cap = (95.0 - excess * 20.0).round().max(35.0);
            gates.push(Gate {
                kind: GateKind::TruePeak,
                value: tp,
                limit: limits.true_peak_max,
                cap: Some(tp_cap),
            });
            cap = cap.min(tp_cap);
            if tp > 0.0 {
                unacceptable = true;
            } else if excess > 0.5 {
                needs_fixes = true;
            }
            log::warn!(
                "true peak gate: {tp:.2} dBTP over {:.2} dBTP ceiling, cap {tp_cap}%",
                limits.true_peak_max
            );
        }
    }

    if let Some(clipping) = finite(MetricKey::ClippingPct) {
        if clipping > 5.0 {
            let clip_cap = (80.0 - (clipping - 5.0) * 4.0).round().max(30.0);
            gates.push(Gate {
                kind: GateKind::Clipping,
                value: clipping,
                limit: 5.0,
                cap: Some(clip_cap),
            });
            cap = cap.min(clip_cap);
            needs_fixes = true;
            log::warn!("clipping gate: {clipping:.2}% of samples, cap {clip_cap}%");
        }
    }

    if let Some(lufs) = finite(MetricKey::LufsIntegrated) {
        if lufs > limits.lufs_max {
            let excess = lufs - limits.lufs_max;
            let lufs_cap = (95.0 - excess * 7.5).round().max(50.0);
            gates.push(Gate {
                kind: GateKind::Loudness,
                value: lufs,
                limit: limits.lufs_max,
                cap: Some(lufs_cap),
            });
            cap = cap.min(lufs_cap);
            if excess >= 4.0 {
                needs_fixes = true;
            }
            log::warn!(
                "loudness gate: {lufs:.1} LUFS over {:.1} ceiling, cap {lufs_cap}%",
                limits.lufs_max
            );
        }
    }

    let mut percentage = result.percentage.min(cap);

    if let Some(dc) = finite(MetricKey::DcOffset).map(f64::abs) {
        if dc > 0.05 {
            gates.push(Gate {
                kind: GateKind::DcOffset,
                value: dc,
                limit: 0.05,
                cap: None,
            });
            percentage = (percentage - 10.0).max(0.0);
            log::warn!("dc offset gate: |{dc:.3}| over 0.05, -10 points");
        }
    }

    let percentage = round_to(percentage, 1);
    let verdict = if unacceptable {
        Verdict::Unacceptable
    } else if needs_fixes {
        Verdict::NeedsFixes
    } else {
        Verdict::Quality(Classification::from_percentage(percentage))
    };

    GatedResult {
        percentage,
        raw_percentage: result.percentage,
        verdict,
        gates,
        mode,
    }
}
