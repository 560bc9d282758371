//! Station Calyx Memory Monitor / Probes (C12).

pub mod log;
pub mod snapshot;

pub use log::append_snapshot;
pub use snapshot::{capacity_inputs, Probe, ProcessRecord, SystemSnapshot};
