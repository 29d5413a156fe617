//! Mix conformity scoring: rate measured audio metrics (loudness,
//! dynamics, peak, stereo, spectral bands) against genre reference
//! profiles and produce a percentage, a quality classification, and a
//! per-metric breakdown.
//!
//! Scoring is a pure, synchronous computation over in-memory values — no
//! I/O, no shared state. Profile loading is the only part that touches
//! the filesystem, in [`profiles`].

pub mod adapter;
pub mod gates;
pub mod metrics;
pub mod profiles;
pub mod reference;
pub mod scoring;

pub use gates::{apply_gates, GatedResult, Mode, Verdict};
pub use metrics::{BandId, Category, MetricKey, MetricSet};
pub use reference::{Range, ReferenceProfile, Target};
pub use scoring::classify::{Classification, Severity, Status};
pub use scoring::{compute_score, ScoreResult, ScoredMetric};

/// Application name for XDG paths
pub const APP_NAME: &str = "mixscore";
