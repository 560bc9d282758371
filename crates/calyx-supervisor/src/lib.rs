//! Station Calyx Supervisor (C7): singleton enforcement and back-off restart.

pub mod state;
pub mod watchdog;

pub use state::{default_state_path, ServiceState, SupervisorState};
pub use watchdog::{
    tick, ServiceSpec, WatchdogEvent, DEFAULT_BACKOFF_SECS, DEFAULT_MAX_RESTARTS,
    DEFAULT_WATCHDOG_INTERVAL_SECS, DEFAULT_WINDOW_SECS, MIN_WATCHDOG_INTERVAL_SECS,
};
