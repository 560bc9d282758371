//! Capacity scoring and guardrail tightening (spec §4.6 steps 1-2).

/// A point-in-time system resource snapshot, as produced by the Memory
/// Monitor (C12).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapacitySnapshot {
    pub cpu_pct: f64,
    pub ram_pct: f64,
    pub gpu_pct: Option<f64>,
}

/// `capacity_score = 0.5*(1 - cpu/100) + 0.5*(1 - ram/100)`, clamped to [0,1].
pub fn capacity_score(snapshot: CapacitySnapshot) -> f64 {
    let cpu_term = 0.5 * (1.0 - snapshot.cpu_pct / 100.0);
    let ram_term = 0.5 * (1.0 - snapshot.ram_pct / 100.0);
    (cpu_term + ram_term).clamp(0.0, 1.0)
}

/// CPU/RAM ceilings after guardrail tightening for the given load mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Guardrails {
    pub cpu_ceiling: f64,
    pub ram_ceiling: f64,
}

pub const BASE_CPU_CEILING: f64 = 80.0;
pub const BASE_RAM_CEILING: f64 = 77.0;

/// High-load mode tightens ceilings by +5 CPU / +3 RAM, capped at 85/80
/// (spec §4.6 step 2 — note the ceiling rises toward the cap, i.e. high
/// load tolerates more headroom consumption before the scheduler backs off).
pub fn guardrails_for(load_mode: calyx_core::LoadMode) -> Guardrails {
    match load_mode {
        calyx_core::LoadMode::Normal => Guardrails {
            cpu_ceiling: BASE_CPU_CEILING,
            ram_ceiling: BASE_RAM_CEILING,
        },
        calyx_core::LoadMode::HighLoad => Guardrails {
            cpu_ceiling: (BASE_CPU_CEILING + 5.0).min(85.0),
            ram_ceiling: (BASE_RAM_CEILING + 3.0).min(80.0),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_score_is_one_at_zero_load() {
        let s = capacity_score(CapacitySnapshot { cpu_pct: 0.0, ram_pct: 0.0, gpu_pct: None });
        assert!((s - 1.0).abs() < 1e-9);
    }

    #[test]
    fn capacity_score_is_zero_at_full_load() {
        let s = capacity_score(CapacitySnapshot { cpu_pct: 100.0, ram_pct: 100.0, gpu_pct: None });
        assert!(s.abs() < 1e-9);
    }

    #[test]
    fn high_load_guardrails_cap_at_85_80() {
        let g = guardrails_for(calyx_core::LoadMode::HighLoad);
        assert_eq!(g.cpu_ceiling, 85.0);
        assert_eq!(g.ram_ceiling, 80.0);
    }

    #[test]
    fn normal_guardrails_are_base() {
        let g = guardrails_for(calyx_core::LoadMode::Normal);
        assert_eq!(g.cpu_ceiling, BASE_CPU_CEILING);
        assert_eq!(g.ram_ceiling, BASE_RAM_CEILING);
    }
}
