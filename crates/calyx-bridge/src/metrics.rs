//! Metric rollups feeding the composite status (spec §4.10): mean TES over
//! the last N runs, and 24h rolling uptime derived from capacity snapshots.

/// Mean of `tes_values`, or `None` if there are no samples — a missing
/// metric is never coerced to a neutral score.
pub fn mean_tes(tes_values: &[f64]) -> Option<f64> {
    if tes_values.is_empty() {
        None
    } else {
        Some(tes_values.iter().sum::<f64>() / tes_values.len() as f64)
    }
}

/// `samples` are `(timestamp_unix, active_process_count)`, chronological.
/// Uptime is the fraction of samples within the trailing 24h window with a
/// nonzero active count (grounded in `bridge_pulse_generator.py`'s
/// "count > 0" liveness check).
pub fn uptime_24h(samples: &[(f64, u32)], now: f64) -> (f64, usize) {
    const WINDOW_SECS: f64 = 24.0 * 60.0 * 60.0;
    let cutoff = now - WINDOW_SECS;
    let recent: Vec<&(f64, u32)> = samples.iter().filter(|(ts, _)| *ts >= cutoff).collect();
    if recent.is_empty() {
        return (0.0, 0);
    }
    let up = recent.iter().filter(|(_, count)| *count > 0).count();
    ((up as f64 / recent.len() as f64) * 100.0, recent.len())
}
