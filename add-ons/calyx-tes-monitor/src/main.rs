//! Station Calyx Telemetry / TES Engine (C9) CLI: tails recent run history
//! and emits de-duplicated early warnings (spec §4.9, §6 `tes-monitor
//! --interval SECS --tail N --once`).

use calyx_core::entities::{Heartbeat, HeartbeatStatus, RunRecord};
use calyx_core::CalyxConfig;
use calyx_telemetry::{
    check_failure_risk, check_memory_high, check_resource_exhaustion, check_tes_decline, failure_risk, Warning,
    WarningTracker,
};
use clap::Parser;
use serde::Serialize;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "calyx-tes-monitor", about = "Station Calyx Telemetry / TES Engine (C9) CLI")]
struct Args {
    #[arg(long, default_value_t = 60)]
    interval: u64,

    #[arg(long, default_value_t = 50)]
    tail: usize,

    /// Check once and exit instead of looping.
    #[arg(long, default_value_t = false)]
    once: bool,
}

const WARNING_WINDOW_SECS: u64 = 1800;

#[derive(Debug, Serialize)]
struct WarningRecord {
    iso_ts: String,
    kind: String,
    severity: String,
    message: String,
}

fn check_once(config: &CalyxConfig, tail: usize, tracker: &mut WarningTracker, now: f64) -> std::io::Result<usize> {
    let history: Vec<RunRecord> = calyx_fabric::read_tail(&config.logs_dir().join("granular_tes.jsonl"), tail).unwrap_or_default();
    let tes_history: Vec<f64> = history.iter().map(|r| r.tes).collect();
    let stabilities: Vec<f64> = history.iter().map(|r| r.stability).collect();

    let latest_memory_pct = history.last().map(|r| r.footprint).unwrap_or(0.0);
    let memory_samples: Vec<(f64, f64)> = history
        .iter()
        .enumerate()
        .map(|(i, r)| (i as f64, r.footprint))
        .collect();

    let mut warnings: Vec<Warning> = Vec::new();
    if let Some(w) = check_tes_decline(&tes_history) {
        warnings.push(w);
    }
    if let Some(w) = check_memory_high(latest_memory_pct) {
        warnings.push(w);
    }
    if let Some(w) = check_failure_risk(failure_risk(&stabilities)) {
        warnings.push(w);
    }
    if let Some(w) = check_resource_exhaustion(&memory_samples) {
        warnings.push(w);
    }

    let mut emitted = 0;
    let path = config.logs_dir().join("early_warnings.jsonl");
    for warning in warnings {
        if !tracker.should_emit(warning.kind, now) {
            continue;
        }
        tracing::warn!(kind = ?warning.kind, severity = ?warning.severity, "{}", warning.message);
        let record = WarningRecord {
            iso_ts: calyx_core::time::now_iso(),
            kind: format!("{:?}", warning.kind),
            severity: format!("{:?}", warning.severity),
            message: warning.message,
        };
        calyx_fabric::append_jsonl(&path, &record).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
        emitted += 1;
    }
    Ok(emitted)
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[calyx-tes-monitor] .env not loaded: {e} (using system environment)");
    }
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into())))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = CalyxConfig::from_env();
    let mut tracker = WarningTracker::new(Duration::from_secs(WARNING_WINDOW_SECS));

    if args.once {
        return match check_once(&config, args.tail, &mut tracker, calyx_core::time::now_ts()) {
            Ok(n) => {
                tracing::info!(emitted = n, "tes-monitor single check complete");
                std::process::ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("[calyx-tes-monitor] check failed: {e}");
                std::process::ExitCode::from(3)
            }
        };
    }

    tracing::info!(interval = args.interval, tail = args.tail, "tes-monitor daemon started");
    let mut tick = tokio::time::interval(Duration::from_secs(args.interval.max(1)));
    loop {
        tokio::select! {
            _ = tick.tick() => {
                let now = calyx_core::time::now_ts();
                if let Err(e) = check_once(&config, args.tail, &mut tracker, now) {
                    tracing::error!(error = %e, "tes-monitor check failed");
                }
                let hb = Heartbeat::new("tes_monitor", "tick", HeartbeatStatus::Running, env!("CARGO_PKG_VERSION"));
                if let Err(e) = calyx_fabric::write_heartbeat(&config.outgoing_dir(), &hb) {
                    tracing::warn!(error = %e, "failed to write tes_monitor heartbeat");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("CTRL-C received; shutting down tes-monitor daemon");
                break;
            }
        }
    }
    std::process::ExitCode::SUCCESS
}
