//! Station Calyx Scheduler (C6) daemon: ticks the capacity-gated dispatch
//! algorithm over the agent roster at a fixed interval, consulting C12 for
//! the current resource snapshot and C4 for dispatch authorization.

use calyx_core::entities::{Freshness, Heartbeat, HeartbeatStatus};
use calyx_core::CalyxConfig;
use calyx_policy::PolicyGate;
use calyx_probes::Probe;
use calyx_scheduler::{capacity::CapacitySnapshot, dispatch, AgentDescriptor, AgentState};
use clap::Parser;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "calyx-schedulerd", about = "Station Calyx Scheduler (C6) daemon")]
struct Args {
    #[arg(long, default_value_t = 30)]
    interval: u64,

    /// Autonomy mode ceiling; the stability-derived mode is never promoted above this.
    #[arg(long, default_value = "apply_tests")]
    mode: String,

    /// Permit automatic promotion toward the ceiling mode as stability improves.
    #[arg(long, default_value_t = false)]
    auto_promote: bool,

    /// Consecutive stable ticks required before promoting autonomy mode.
    #[arg(long, default_value_t = 3)]
    promote_after: u32,

    /// Minimum minutes between dispatches of the same agent.
    #[arg(long, default_value_t = 5)]
    cooldown_mins: u64,
}

/// Agent roster descriptor, loaded from `outgoing/policies/agents.json`.
/// An empty or missing roster means the scheduler has nothing to dispatch —
/// it still ticks and writes heartbeats, per spec §4.1 (every component
/// reports liveness regardless of whether it has work).
#[derive(Debug, Clone, Deserialize)]
struct AgentRoster {
    #[serde(default)]
    agents: Vec<RosterEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct RosterEntry {
    id: String,
    #[serde(default)]
    priority: u32,
    #[serde(default)]
    min_capacity: f64,
}

fn load_roster(outgoing_dir: &std::path::Path) -> Vec<AgentDescriptor> {
    let path = outgoing_dir.join("policies").join("agents.json");
    let roster: AgentRoster = std::fs::read(&path)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or(AgentRoster { agents: Vec::new() });
    roster
        .agents
        .into_iter()
        .map(|e| AgentDescriptor { id: e.id, priority: e.priority, min_capacity: e.min_capacity, cooldown: Duration::from_secs(0) })
        .collect()
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[calyx-schedulerd] .env not loaded: {e} (using system environment)");
    }
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into())))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = CalyxConfig::from_env();
    let cooldown = Duration::from_secs(args.cooldown_mins * 60);
    let ceiling_mode = calyx_core::entities::AutonomyMode::from_str(&args.mode).unwrap_or(calyx_core::entities::AutonomyMode::ApplyTests);

    let policy = PolicyGate::open(&config.outgoing_dir(), config.policy_version_override);
    let mut probe = Probe::new();
    let mut states: HashMap<String, AgentState> = HashMap::new();

    tracing::info!(interval_secs = args.interval, mode_ceiling = args.mode, "scheduler daemon started");

    let mut tick_timer = tokio::time::interval(Duration::from_secs(args.interval.max(1)));
    loop {
        tokio::select! {
            _ = tick_timer.tick() => {
                probe.refresh();
                let snapshot = probe.sample();
                let mut agents = load_roster(&config.outgoing_dir());
                for agent in &mut agents {
                    agent.cooldown = cooldown;
                }
                let outgoing = config.outgoing_dir();
                let outcomes = dispatch::tick(
                    &agents,
                    &mut states,
                    CapacitySnapshot { cpu_pct: snapshot.cpu_pct, ram_pct: snapshot.ram_pct, gpu_pct: snapshot.gpu_pct },
                    config.load_mode,
                    calyx_core::time::now_ts(),
                    |id| {
                        let now = calyx_core::time::now_ts();
                        match calyx_fabric::read_heartbeat(&outgoing, id) {
                            Ok(Some(hb)) => (hb.freshness_at(now, config.heartbeat_ttl_secs), Some(hb.status)),
                            Ok(None) => (Freshness::Missing, None),
                            Err(_) => (Freshness::Missing, None),
                        }
                    },
                    |_id| None,
                    &policy,
                    |id, mode| {
                        let capped = if (mode as u8) > (ceiling_mode as u8) { ceiling_mode } else { mode };
                        tracing::info!(agent = id, mode = capped.as_str(), auto_promote = args.auto_promote, promote_after = args.promote_after, "dispatching agent");
                    },
                );
                tracing::debug!(outcomes = outcomes.len(), "scheduler tick complete");
                let hb = Heartbeat::new("scheduler", "tick", HeartbeatStatus::Running, env!("CARGO_PKG_VERSION"))
                    .with_extra("capacity_score", calyx_scheduler::capacity_score(CapacitySnapshot { cpu_pct: snapshot.cpu_pct, ram_pct: snapshot.ram_pct, gpu_pct: snapshot.gpu_pct }))
                    .with_extra("agents_considered", agents.len());
                if let Err(e) = calyx_fabric::write_heartbeat(&config.outgoing_dir(), &hb) {
                    tracing::warn!(error = %e, "failed to write scheduler heartbeat");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("CTRL-C received; shutting down scheduler daemon");
                break;
            }
        }
    }
    std::process::ExitCode::SUCCESS
}
