//! Watchdog tick algorithm (spec §4.7), grounded on `svc_supervisor.py`'s
//! `_ensure_with_backoff` / `ensure_processes` loop: process discovery by
//! signature match (never by trusting a stored PID file), start-on-missing
//! with a rolling-window back-off, and singleton pruning of duplicates.

use crate::state::{ServiceState, SupervisorState};
use serde::Serialize;
use sysinfo::System;

/// Declares one supervised service. `signature_pattern` is matched as a
/// substring against the process's joined command line — the same
/// `pgrep -af <pattern>` idiom the original tool uses, so the supervisor
/// never has to trust a PID it did not itself just spawn.
#[derive(Debug, Clone)]
pub struct ServiceSpec {
    pub key: String,
    pub signature_pattern: String,
    pub command: String,
    pub args: Vec<String>,
    pub singleton: bool,
}

pub const DEFAULT_WINDOW_SECS: f64 = 600.0;
pub const DEFAULT_MAX_RESTARTS: usize = 3;
pub const DEFAULT_BACKOFF_SECS: f64 = 300.0;
pub const DEFAULT_WATCHDOG_INTERVAL_SECS: f64 = 60.0;
pub const MIN_WATCHDOG_INTERVAL_SECS: f64 = 15.0;

#[derive(Debug, Clone, Serialize)]
pub enum WatchdogEvent {
    Ok { key: String },
    Started { key: String, pid: u32 },
    Backoff { key: String, backoff_until: f64 },
    PrunedDuplicate { key: String, killed_pid: u32, kept_pid: u32 },
    StartFailed { key: String, error: String },
}

struct Match {
    pid: u32,
    start_time: u64,
}

fn find_matches(sys: &System, pattern: &str) -> Vec<Match> {
    sys.processes()
        .iter()
        .filter_map(|(pid, p)| {
            let cmdline = p.cmd().join(" ");
            let name_line = format!("{} {}", p.name(), cmdline);
            if name_line.contains(pattern) {
                Some(Match { pid: pid.as_u32(), start_time: p.start_time() })
            } else {
                None
            }
        })
        .collect()
}

/// Runs one watchdog pass over `specs`, mutating `state` in place and
/// returning one event per spec. Never kills a process that did not match
/// its own spec's signature pattern.
pub async fn tick(
    specs: &[ServiceSpec],
    state: &mut SupervisorState,
    now: f64,
    window_sec: f64,
    max_restarts: usize,
    backoff_sec: f64,
) -> Vec<WatchdogEvent> {
    let mut sys = System::new_all();
    sys.refresh_all();

    let mut events = Vec::with_capacity(specs.len());
    for spec in specs {
        let mut matches = find_matches(&sys, &spec.signature_pattern);
        matches.sort_by_key(|m| m.start_time);

        if spec.singleton && matches.len() >= 2 {
            let keep = matches[0].pid;
            for dup in &matches[1..] {
                if let Some(process) = sys.process(sysinfo::Pid::from_u32(dup.pid)) {
                    process.kill();
                    events.push(WatchdogEvent::PrunedDuplicate { key: spec.key.clone(), killed_pid: dup.pid, kept_pid: keep });
                }
            }
            matches.truncate(1);
        }

        if !matches.is_empty() {
            events.push(WatchdogEvent::Ok { key: spec.key.clone() });
            continue;
        }

        let svc_state = state.services.entry(spec.key.clone()).or_default();
        if now < svc_state.backoff_until {
            events.push(WatchdogEvent::Backoff { key: spec.key.clone(), backoff_until: svc_state.backoff_until });
            continue;
        }

        match start_detached(&spec.command, &spec.args).await {
            Ok(pid) => {
                record_restart(svc_state, now, window_sec, max_restarts, backoff_sec);
                svc_state.last_pid = Some(pid);
                events.push(WatchdogEvent::Started { key: spec.key.clone(), pid });
            }
            Err(e) => {
                record_restart(svc_state, now, window_sec, max_restarts, backoff_sec);
                events.push(WatchdogEvent::StartFailed { key: spec.key.clone(), error: e.to_string() });
            }
        }
    }
    events
}

fn record_restart(svc_state: &mut ServiceState, now: f64, window_sec: f64, max_restarts: usize, backoff_sec: f64) {
    svc_state.restart_times.retain(|t| now - t <= window_sec);
    svc_state.restart_times.push(now);
    if svc_state.restart_times.len() >= max_restarts {
        svc_state.backoff_until = now + backoff_sec;
    }
}

async fn start_detached(command: &str, args: &[String]) -> std::io::Result<u32> {
    let mut cmd = tokio::process::Command::new(command);
    cmd.args(args);
    cmd.stdin(std::process::Stdio::null());
    cmd.stdout(std::process::Stdio::null());
    cmd.stderr(std::process::Stdio::null());
    let child = cmd.spawn()?;
    Ok(child.id().unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_restart_enters_backoff_at_threshold() {
        let mut state = ServiceState::default();
        for t in [0.0, 100.0, 200.0] {
            record_restart(&mut state, t, DEFAULT_WINDOW_SECS, DEFAULT_MAX_RESTARTS, DEFAULT_BACKOFF_SECS);
        }
        assert_eq!(state.restart_times.len(), 3);
        assert_eq!(state.backoff_until, 200.0 + DEFAULT_BACKOFF_SECS);
    }

    #[test]
    fn record_restart_drops_entries_outside_window() {
        let mut state = ServiceState::default();
        record_restart(&mut state, 0.0, 600.0, 3, 300.0);
        record_restart(&mut state, 1000.0, 600.0, 3, 300.0);
        assert_eq!(state.restart_times, vec![1000.0]);
    }

    #[tokio::test]
    async fn tick_starts_missing_service() {
        let mut state = SupervisorState::default();
        let specs = vec![ServiceSpec {
            key: "echo_test".into(),
            signature_pattern: "a-signature-nothing-will-ever-match".into(),
            command: "true".into(),
            args: vec![],
            singleton: true,
        }];
        let events = tick(&specs, &mut state, 0.0, DEFAULT_WINDOW_SECS, DEFAULT_MAX_RESTARTS, DEFAULT_BACKOFF_SECS).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], WatchdogEvent::Started { .. }));
    }

    #[tokio::test]
    async fn tick_respects_backoff() {
        let mut state = SupervisorState::default();
        state.services.insert(
            "svc".to_string(),
            ServiceState { restart_times: vec![], backoff_until: 1_000_000.0, last_pid: None },
        );
        let specs = vec![ServiceSpec {
            key: "svc".into(),
            signature_pattern: "a-signature-nothing-will-ever-match".into(),
            command: "true".into(),
            args: vec![],
            singleton: true,
        }];
        let events = tick(&specs, &mut state, 0.0, DEFAULT_WINDOW_SECS, DEFAULT_MAX_RESTARTS, DEFAULT_BACKOFF_SECS).await;
        assert!(matches!(events[0], WatchdogEvent::Backoff { .. }));
    }
}
