//! Station Calyx Scheduler (C6): capacity-gated dispatch of agent work.

pub mod capacity;
pub mod dispatch;

pub use capacity::{capacity_score, guardrails_for, CapacitySnapshot, Guardrails};
pub use dispatch::{mode_for_stability, tick, AgentDescriptor, AgentState, TickOutcome};
