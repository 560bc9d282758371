//! Station Calyx Cross-Agent Query Bus (C11).

pub mod bus;
pub mod registry;

pub use bus::{filter_for, AgentFilter, QueryBus};
pub use registry::CapabilityRegistry;
