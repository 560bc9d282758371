//! Station Calyx Supervisor (C7) daemon: periodically confirms each
//! supervised service is alive by process-signature match, restarting with
//! back-off on absence and pruning duplicates for singleton services.

use calyx_core::entities::{Heartbeat, HeartbeatStatus};
use calyx_core::CalyxConfig;
use calyx_supervisor::{watchdog, ServiceSpec, SupervisorState};
use clap::Parser;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "calyx-supervisord", about = "Station Calyx Supervisor (C7) daemon")]
struct Args {
    /// Watchdog tick interval in seconds.
    #[arg(long, default_value_t = watchdog::DEFAULT_WATCHDOG_INTERVAL_SECS as u64)]
    interval: u64,

    /// Rolling restart window and count, as `WINDOW/COUNT` (e.g. `600/3`).
    #[arg(long, default_value = "600/3")]
    max_restart: String,

    /// Back-off duration in seconds once `max_restart` is exceeded.
    #[arg(long, default_value_t = watchdog::DEFAULT_BACKOFF_SECS as u64)]
    backoff: u64,
}

fn parse_max_restart(spec: &str) -> (f64, usize) {
    spec.split_once('/')
        .and_then(|(w, c)| Some((w.parse::<f64>().ok()?, c.parse::<usize>().ok()?)))
        .unwrap_or((watchdog::DEFAULT_WINDOW_SECS, watchdog::DEFAULT_MAX_RESTARTS))
}

fn supervised_services() -> Vec<ServiceSpec> {
    vec![
        ServiceSpec {
            key: "scheduler".to_string(),
            signature_pattern: "calyx-schedulerd".to_string(),
            command: "calyx-schedulerd".to_string(),
            args: vec![],
            singleton: true,
        },
        ServiceSpec {
            key: "bridge_pulse".to_string(),
            signature_pattern: "calyx-bridge-pulsed".to_string(),
            command: "calyx-bridge-pulsed".to_string(),
            args: vec![],
            singleton: true,
        },
        ServiceSpec {
            key: "tes_monitor".to_string(),
            signature_pattern: "calyx-tes-monitor".to_string(),
            command: "calyx-tes-monitor".to_string(),
            args: vec!["--interval".to_string(), "60".to_string()],
            singleton: true,
        },
    ]
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[calyx-supervisord] .env not loaded: {e} (using system environment)");
    }
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into())))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = CalyxConfig::from_env();
    let (window_sec, max_restarts) = parse_max_restart(&args.max_restart);
    let interval = Duration::from_secs(args.interval.max(watchdog::MIN_WATCHDOG_INTERVAL_SECS as u64));
    let backoff_sec = args.backoff as f64;

    let state_path = calyx_supervisor::default_state_path(&config);
    let mut state = SupervisorState::load(&state_path);
    let specs = supervised_services();

    tracing::info!(interval_secs = interval.as_secs(), services = specs.len(), "supervisor daemon started");

    let mut tick = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = tick.tick() => {
                let now = calyx_core::time::now_ts();
                let events = watchdog::tick(&specs, &mut state, now, window_sec, max_restarts, backoff_sec).await;
                for event in &events {
                    tracing::info!(?event, "supervisor tick event");
                }
                if let Err(e) = state.save(&state_path) {
                    tracing::warn!(error = %e, "failed to persist supervisor state");
                }
                let hb = Heartbeat::new("supervisor", "tick", HeartbeatStatus::Running, env!("CARGO_PKG_VERSION"))
                    .with_extra("events", &events);
                if let Err(e) = calyx_fabric::write_heartbeat(&config.outgoing_dir(), &hb) {
                    tracing::warn!(error = %e, "failed to write supervisor heartbeat");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("CTRL-C received; shutting down supervisor daemon");
                break;
            }
        }
    }
    std::process::ExitCode::SUCCESS
}
