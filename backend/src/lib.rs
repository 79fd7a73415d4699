//! Barista Simulator Core - Rust Engine
//!
//! Discrete-minute simulation of a coffee counter: orders arrive, a
//! priority policy ranks them, baristas prepare them, and impatient
//! customers leave. Deterministic for a given seed.
//!
//! # Architecture
//!
//! - **core**: Minute clock
//! - **rng**: Deterministic random number generation
//! - **models**: Domain types (Order, Barista, State, Event)
//! - **policy**: FIFO and SMART ranking
//! - **dispatch**: Ranking pass, assignment, fairness accounting
//! - **pool**: Fixed set of baristas
//! - **arrivals**: Random orders, rush batches, Poisson arrivals
//! - **metrics**: Running, windowed and per-barista statistics
//! - **orchestrator**: Main simulation loop and checkpoints
//! - **comparison**: SMART vs FIFO over one replayed schedule
//! - **service**: Lock-serialized live facade
//!
//! # Critical Invariants
//!
//! 1. Every order ever created is in exactly one of: queue, a barista,
//!    completed log, abandoned log
//! 2. All randomness is deterministic (seeded RNG)
//! 3. Orders only move forward: Queued → InService → Completed, or
//!    Queued → Abandoned

// Module declarations
pub mod arrivals;
pub mod comparison;
pub mod core;
pub mod dispatch;
pub mod metrics;
pub mod models;
pub mod orchestrator;
pub mod policy;
pub mod pool;
pub mod rng;
pub mod service;

// Re-exports for convenience
pub use arrivals::{ArrivalConfig, ArrivalMode};
pub use comparison::{run_comparison, ComparisonHarness, ComparisonReport, ComparisonRequest};
pub use core::time::TimeManager;
pub use metrics::{AnalyticsReport, MetricsSnapshot};
pub use models::{
    barista::{Barista, BaristaError},
    event::{Event, EventLog},
    menu::{CustomerType, DrinkType},
    order::{Order, OrderError, OrderId, OrderStatus},
    state::SimulationState,
};
pub use orchestrator::{EngineConfig, SimulationClock, SimulationError, TickResult};
pub use policy::QueueMode;
pub use rng::RngManager;
pub use service::CoffeeShop;
