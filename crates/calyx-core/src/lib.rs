//! Station Calyx core: shared entity schemas, error taxonomy, configuration,
//! and time helpers used by every other crate in the workspace.

pub mod config;
pub mod entities;
pub mod envutil;
pub mod error;
pub mod time;

pub use config::{CalyxConfig, LoadMode};
pub use error::{CalyxError, CalyxResult};
