//! Station Calyx: Telemetry / TES Engine (C9).
//!
//! Per-run scoring (stability/velocity/footprint -> tes_v2/tes_v3), trend
//! derivation, anomaly detection, early warnings, and the resource-draw
//! heuristics supplementing the core formula (spec §4.9).

pub mod anomaly;
pub mod resource_draw;
pub mod scorer;
pub mod tes;
pub mod trend;
pub mod warnings;

pub use anomaly::{classify, compute_baseline, z_score, AnomalySeverity, Baseline};
pub use resource_draw::{audit_llm_stats, warn_on_frequency, warn_on_resource_draw, warn_on_tes_surge, DrawNote};
pub use scorer::{score_and_log, score_run, RunInputs};
pub use tes::{footprint, hint, tes_v2, tes_v3, velocity};
pub use trend::{derive_trend, Trend, TrendDirection};
pub use warnings::{
    check_failure_risk, check_memory_high, check_resource_exhaustion, check_tes_decline, failure_risk,
    predict_resource_exhaustion, Severity, Warning, WarningKind, WarningTracker,
};
