//! Manual shutdown quiesce (SPEC_FULL.md §2, grounded in
//! `enhanced_bridge_pulse.py`'s `manual_shutdown.flag` check): an operator
//! can drop a flag file to force the pulse into a quiesced state regardless
//! of what the resource and TES thresholds would otherwise classify. This
//! wraps [`crate::status::PulseStatus`] rather than adding a variant to it,
//! so the already-tested classification logic stays untouched.

use std::path::Path;

pub const MANUAL_SHUTDOWN_FLAG_NAME: &str = "manual_shutdown.flag";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveStatus {
    Quiesced,
    Pulse(crate::status::PulseStatus),
}

impl EffectiveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectiveStatus::Quiesced => "QUIESCED",
            EffectiveStatus::Pulse(crate::status::PulseStatus::Green) => "GREEN",
            EffectiveStatus::Pulse(crate::status::PulseStatus::Yellow) => "YELLOW",
            EffectiveStatus::Pulse(crate::status::PulseStatus::Red) => "RED",
        }
    }
}

/// `true` when `outgoing_dir/manual_shutdown.flag` exists. The flag is
/// never created or removed by the controller itself — only an operator
/// placing or deleting the file changes this.
pub fn is_quiesced(outgoing_dir: &Path) -> bool {
    outgoing_dir.join(MANUAL_SHUTDOWN_FLAG_NAME).exists()
}

/// Applies quiesce override on top of an already-computed status.
pub fn effective_status(outgoing_dir: &Path, status: crate::status::PulseStatus) -> EffectiveStatus {
    if is_quiesced(outgoing_dir) {
        EffectiveStatus::Quiesced
    } else {
        EffectiveStatus::Pulse(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::PulseStatus;

    #[test]
    fn no_flag_passes_status_through() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(effective_status(dir.path(), PulseStatus::Green), EffectiveStatus::Pulse(PulseStatus::Green));
    }

    #[test]
    fn flag_present_overrides_to_quiesced() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANUAL_SHUTDOWN_FLAG_NAME), b"").unwrap();
        assert_eq!(effective_status(dir.path(), PulseStatus::Red), EffectiveStatus::Quiesced);
    }

    #[test]
    fn quiesced_as_str() {
        assert_eq!(EffectiveStatus::Quiesced.as_str(), "QUIESCED");
        assert_eq!(EffectiveStatus::Pulse(PulseStatus::Red).as_str(), "RED");
    }
}
