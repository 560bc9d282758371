//! Composite pulse status (spec §4.10), cut points taken directly from
//! `bridge_pulse_generator.py`'s `generate_report`: GREEN requires both
//! 24h uptime >= 90% and mean TES >= 95; YELLOW covers uptime >= 80% and
//! mean TES >= 85 (or no samples yet, which is never a green light); else
//! RED. See DESIGN.md for why this resolves the spec's open cut-point
//! question rather than inventing new ones.

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PulseStatus {
    Green,
    Yellow,
    Red,
}

pub fn classify(uptime_24h_pct: Option<f64>, mean_tes: Option<f64>, sample_count: usize) -> PulseStatus {
    if sample_count == 0 || mean_tes.is_none() {
        return PulseStatus::Yellow;
    }
    let uptime = uptime_24h_pct.unwrap_or(0.0);
    let tes = mean_tes.unwrap();
    if uptime >= 90.0 && tes >= 95.0 {
        PulseStatus::Green
    } else if uptime >= 80.0 && tes >= 85.0 {
        PulseStatus::Yellow
    } else {
        PulseStatus::Red
    }
}

/// Per-resource pressure level, cut points from `enhanced_bridge_pulse.py`'s
/// heatmap (`< 70` low, `< 85` medium, else high).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceLevel {
    Low,
    Medium,
    High,
}

pub fn resource_level(pct: f64) -> ResourceLevel {
    if pct < 70.0 {
        ResourceLevel::Low
    } else if pct < 85.0 {
        ResourceLevel::Medium
    } else {
        ResourceLevel::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_samples_is_yellow_not_green() {
        assert_eq!(classify(None, None, 0), PulseStatus::Yellow);
    }

    #[test]
    fn high_uptime_and_tes_is_green() {
        assert_eq!(classify(Some(95.0), Some(97.0), 10), PulseStatus::Green);
    }

    #[test]
    fn moderate_uptime_and_tes_is_yellow() {
        assert_eq!(classify(Some(85.0), Some(88.0), 10), PulseStatus::Yellow);
    }

    #[test]
    fn low_uptime_and_tes_is_red() {
        assert_eq!(classify(Some(60.0), Some(70.0), 10), PulseStatus::Red);
    }

    #[test]
    fn resource_level_bands() {
        assert_eq!(resource_level(50.0), ResourceLevel::Low);
        assert_eq!(resource_level(75.0), ResourceLevel::Medium);
        assert_eq!(resource_level(90.0), ResourceLevel::High);
    }
}
