//! Station Calyx Bridge Pulse Controller (C10) CLI: runs one macro-cadence
//! assessment (spec §6 `bridge-pulse --report-id ID --output DIR`), or loops
//! at macro/micro cadence when invoked with no `--report-id` (daemon mode).

use calyx_bridge::{assess, BridgeInputs, Cadence};
use calyx_core::entities::{Heartbeat, HeartbeatStatus, PulseOutcome, RunRecord};
use calyx_core::CalyxConfig;
use calyx_policy::lease::LeaseManager;
use calyx_probes::{Probe, SystemSnapshot};
use calyx_store::ExperienceStore;
use clap::Parser;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "calyx-bridge-pulsed", about = "Station Calyx Bridge Pulse Controller (C10)")]
struct Args {
    /// Run a single assessment tagged with this id and exit, instead of looping.
    #[arg(long)]
    report_id: Option<String>,

    /// Reports directory override (defaults to the configured root's `reports/`).
    #[arg(long)]
    output: Option<std::path::PathBuf>,
}

const SIGNING_KEY_ENV: &str = "CALYX_BRIDGE_SIGNING_KEY";
const TES_WINDOW: usize = 50;
const UPTIME_WINDOW: usize = 1440;

fn gather_inputs(config: &CalyxConfig, probe: &mut Probe) -> BridgeInputs {
    probe.refresh();
    let snapshot = probe.sample();

    let recent_runs: Vec<RunRecord> =
        calyx_fabric::read_tail(&config.logs_dir().join("granular_tes.jsonl"), TES_WINDOW).unwrap_or_default();
    let recent_tes: Vec<f64> = recent_runs.iter().map(|r| r.tes).collect();

    let recent_snapshots: Vec<SystemSnapshot> =
        calyx_fabric::read_tail(&config.logs_dir().join("system_snapshots.jsonl"), UPTIME_WINDOW).unwrap_or_default();
    let mut uptime_samples: Vec<(f64, u32)> = recent_snapshots.iter().map(|s| (s.ts, s.active_process_count)).collect();
    uptime_samples.push((snapshot.ts, snapshot.active_process_count));

    BridgeInputs {
        cpu_pct: snapshot.cpu_pct,
        ram_pct: snapshot.ram_pct,
        gpu_pct: snapshot.gpu_pct,
        recent_tes,
        uptime_samples,
        autonomy_mode: "tests".to_string(),
        active_agents: snapshot.active_process_count,
        gates_state: BTreeMap::new(),
        policy_violations: 0,
        manual_interventions: 0,
    }
}

fn run_once(config: &CalyxConfig, probe: &mut Probe, store: &ExperienceStore, lease_mgr: &LeaseManager, reports_dir: &std::path::Path, report_id: Option<&str>) -> std::process::ExitCode {
    let inputs = gather_inputs(config, probe);
    let now = calyx_core::time::now_ts();
    match assess(&config.outgoing_dir(), reports_dir, store, lease_mgr, &inputs, now, report_id) {
        Ok(result) => {
            tracing::info!(pulse_id = %result.pulse.pulse_id, status = result.effective_status.as_str(), report = %result.report_path.display(), "bridge pulse recorded");
            match result.pulse.outcome {
                PulseOutcome::Fail => std::process::ExitCode::from(1),
                _ => std::process::ExitCode::SUCCESS,
            }
        }
        Err(e) => {
            let calyx_err: calyx_core::CalyxError = e.into();
            eprintln!("[calyx-bridge-pulsed] assessment failed: {calyx_err}");
            std::process::ExitCode::from(calyx_err.exit_code() as u8)
        }
    }
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[calyx-bridge-pulsed] .env not loaded: {e} (using system environment)");
    }
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into())))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = CalyxConfig::from_env();
    let reports_dir = args.output.clone().unwrap_or_else(|| config.reports_dir());
    let signing_key = std::env::var(SIGNING_KEY_ENV).unwrap_or_else(|_| "calyx-dev-signing-key".to_string());

    let store = match ExperienceStore::open(config.memory_dir().join("experience.sqlite")) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("[calyx-bridge-pulsed] cannot open experience store: {e}");
            return std::process::ExitCode::from(3);
        }
    };
    let lease_mgr = LeaseManager::open(&config.outgoing_dir(), signing_key);
    let mut probe = Probe::new();

    if let Some(report_id) = args.report_id.as_deref() {
        return run_once(&config, &mut probe, &store, &lease_mgr, &reports_dir, Some(report_id));
    }

    tracing::info!(macro_secs = Cadence::Macro.interval().as_secs(), micro_secs = Cadence::Micro.interval().as_secs(), "bridge pulse daemon started");
    let mut tick = tokio::time::interval(Duration::from_secs(calyx_bridge::MICRO_INTERVAL_SECS));
    let mut since_macro = Duration::from_secs(calyx_bridge::MACRO_INTERVAL_SECS);
    loop {
        tokio::select! {
            _ = tick.tick() => {
                since_macro += Duration::from_secs(calyx_bridge::MICRO_INTERVAL_SECS);
                if calyx_bridge::is_due(Cadence::Macro, since_macro) {
                    since_macro = Duration::ZERO;
                    run_once(&config, &mut probe, &store, &lease_mgr, &reports_dir, None);
                }
                let hb = Heartbeat::new("bridge_pulse", "tick", HeartbeatStatus::Running, env!("CARGO_PKG_VERSION"));
                if let Err(e) = calyx_fabric::write_heartbeat(&config.outgoing_dir(), &hb) {
                    tracing::warn!(error = %e, "failed to write bridge_pulse heartbeat");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("CTRL-C received; shutting down bridge pulse daemon");
                break;
            }
        }
    }
    std::process::ExitCode::SUCCESS
}
