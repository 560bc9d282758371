//! System-wide resource sampling (spec §4.12), grounded on the teacher's
//! `SystemTelemetry` (`pagi-skills::system`): `sysinfo::System` refreshed
//! once per sample, CPU/RAM read off the global snapshot, process list
//! reduced to the top-N by CPU usage for operator diagnosis only (the
//! Scheduler never sees raw process records, only the derived capacity
//! score).

use serde::{Deserialize, Serialize};
use sysinfo::System;

/// One point-in-time system resource sample (spec §3 "system-wide
/// CPU/RAM/disk/network, and — when available — GPU utilization").
/// `sysinfo` has no GPU counters, so `gpu_pct` is always `None` here; the
/// field is kept so a future platform-specific probe can populate it
/// without changing the schema (see DESIGN.md).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub ts: f64,
    pub cpu_pct: f64,
    pub ram_pct: f64,
    #[serde(default)]
    pub gpu_pct: Option<f64>,
    pub disk_total_bytes: u64,
    pub disk_available_bytes: u64,
    pub active_process_count: u32,
}

/// Top-N process record for operator diagnosis (read-only; spec §4.12).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    pub cpu_pct: f32,
    pub memory_bytes: u64,
}

pub struct Probe {
    sys: System,
}

impl Probe {
    /// Builds a probe with one initial refresh. `sysinfo` requires at
    /// least two refreshes separated by a short interval for per-process
    /// CPU percentages to be meaningful; callers that need that should
    /// call [`Probe::refresh`] once before [`Probe::sample`].
    pub fn new() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();
        Self { sys }
    }

    pub fn refresh(&mut self) {
        self.sys.refresh_all();
    }

    pub fn sample(&self) -> SystemSnapshot {
        let total_mem = self.sys.total_memory().max(1);
        let used_mem = self.sys.used_memory();
        let ram_pct = (used_mem as f64 / total_mem as f64) * 100.0;
        let cpu_pct = self.sys.global_cpu_info().cpu_usage() as f64;
        let disks = sysinfo::Disks::new_with_refreshed_list();
        let (disk_total, disk_available) = disks
            .iter()
            .fold((0u64, 0u64), |(total, available), d| (total + d.total_space(), available + d.available_space()));
        SystemSnapshot {
            ts: calyx_core::time::now_ts(),
            cpu_pct,
            ram_pct,
            gpu_pct: None,
            disk_total_bytes: disk_total,
            disk_available_bytes: disk_available,
            active_process_count: self.sys.processes().len() as u32,
        }
    }

    /// The `n` processes with the highest CPU usage, for operator
    /// diagnosis only — never consumed by Scheduler dispatch logic.
    pub fn top_processes(&self, n: usize) -> Vec<ProcessRecord> {
        let mut processes: Vec<ProcessRecord> = self
            .sys
            .processes()
            .iter()
            .map(|(pid, p)| ProcessRecord { pid: pid.as_u32(), name: p.name().to_string(), cpu_pct: p.cpu_usage(), memory_bytes: p.memory() })
            .collect();
        processes.sort_by(|a, b| b.cpu_pct.partial_cmp(&a.cpu_pct).unwrap_or(std::cmp::Ordering::Equal));
        processes.truncate(n);
        processes
    }
}

impl Default for Probe {
    fn default() -> Self {
        Self::new()
    }
}

/// Derives the Scheduler's `capacity_score` input tuple `(cpu_pct,
/// ram_pct, gpu_pct)` from a snapshot — the formula itself lives in
/// `calyx-scheduler::capacity` (spec §4.6 step 1), kept out of this crate
/// so probes never depend on scheduling policy.
pub fn capacity_inputs(snapshot: &SystemSnapshot) -> (f64, f64, Option<f64>) {
    (snapshot.cpu_pct, snapshot.ram_pct, snapshot.gpu_pct)
}
