//! Orchestrator - main simulation loop
//!
//! Implements the minute-by-minute tick loop integrating arrivals, service,
//! dispatch and abandonment.
//!
//! See `engine.rs` for full implementation.

pub mod checkpoint;
pub mod engine;

// Re-export main types for convenience
pub use engine::{EngineConfig, QueuedOrderView, SimulationClock, SimulationError, TickResult};

// Re-export checkpoint types
pub use checkpoint::{compute_config_hash, StateSnapshot};
