//! Domain models for the barista simulator

pub mod barista;
pub mod event;
pub mod menu;
pub mod order;
pub mod state;

// Re-exports
pub use barista::{Barista, BaristaError, BaristaStatus};
pub use event::{Event, EventLog};
pub use menu::{CustomerType, DrinkType};
pub use order::{Order, OrderError, OrderId, OrderStatus, Urgency};
pub use state::SimulationState;
