//! Live counter service
//!
//! `CoffeeShop` is the command/query surface an outer layer (HTTP handler,
//! UI loop, CLI) talks to. It owns one `SimulationClock` behind a
//! `parking_lot::Mutex`: every command and every read takes the same lock,
//! so callers only ever observe states where the conservation invariant
//! holds. Reads return owned snapshot values built under the lock.
//!
//! Comparisons copy the engine config under the lock and then run on their
//! own clocks without holding it.
//!
//! # Example
//!
//! ```
//! use barista_simulator_core_rs::service::CoffeeShop;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let shop = Arc::new(CoffeeShop::with_defaults().unwrap());
//! let handles: Vec<_> = (0..4)
//!     .map(|_| {
//!         let shop = Arc::clone(&shop);
//!         thread::spawn(move || {
//!             shop.add_random_order();
//!         })
//!     })
//!     .collect();
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! assert_eq!(shop.metrics().total_created, 4);
//! ```

use crate::comparison::{ComparisonHarness, ComparisonReport, ComparisonRequest};
use crate::metrics::{AnalyticsReport, MetricsSnapshot, WorkerBreakdown};
use crate::models::menu::CustomerType;
use crate::models::order::Order;
use crate::orchestrator::{EngineConfig, QueuedOrderView, SimulationClock, SimulationError, TickResult};
use crate::policy::QueueMode;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Queue, workers and metrics read at a single instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopSnapshot {
    pub queue: Vec<QueuedOrderView>,
    pub workers: Vec<WorkerBreakdown>,
    pub metrics: MetricsSnapshot,
}

#[derive(Debug)]
pub struct CoffeeShop {
    clock: Mutex<SimulationClock>,
}

impl CoffeeShop {
    pub fn new(config: EngineConfig) -> Result<Self, SimulationError> {
        Ok(Self {
            clock: Mutex::new(SimulationClock::new(config)?),
        })
    }

    pub fn with_defaults() -> Result<Self, SimulationError> {
        Self::new(EngineConfig::default())
    }

    /// Wrap an existing clock (e.g. one restored from a checkpoint)
    pub fn from_clock(clock: SimulationClock) -> Self {
        Self {
            clock: Mutex::new(clock),
        }
    }

    // Commands

    /// Enqueue one order by menu name; unknown drinks create nothing
    pub fn create_order(&self, drink: &str, customer: Option<CustomerType>) -> Result<Order, SimulationError> {
        self.clock.lock().create_order_named(drink, customer)
    }

    pub fn add_random_order(&self) -> Order {
        self.clock.lock().add_random_order()
    }

    pub fn advance_one_minute(&self) -> Result<TickResult, SimulationError> {
        self.clock.lock().advance_one_minute()
    }

    pub fn trigger_rush_hour(&self) -> usize {
        self.clock.lock().trigger_rush_hour()
    }

    pub fn switch_mode(&self, mode: QueueMode) {
        self.clock.lock().switch_mode(mode);
    }

    pub fn toggle_auto_arrivals(&self, enabled: bool, rate: Option<f64>) -> Result<(), SimulationError> {
        self.clock.lock().toggle_auto_arrivals(enabled, rate)
    }

    pub fn reset(&self) {
        self.clock.lock().reset();
    }

    // Queries

    pub fn queue_snapshot(&self) -> Vec<QueuedOrderView> {
        self.clock.lock().queue_snapshot()
    }

    pub fn worker_snapshot(&self) -> Vec<WorkerBreakdown> {
        self.clock.lock().worker_snapshot()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.clock.lock().metrics()
    }

    pub fn analytics(&self) -> AnalyticsReport {
        self.clock.lock().analytics()
    }

    /// Queue, workers and metrics under one lock acquisition
    pub fn snapshot(&self) -> ShopSnapshot {
        let clock = self.clock.lock();
        ShopSnapshot {
            queue: clock.queue_snapshot(),
            workers: clock.worker_snapshot(),
            metrics: clock.metrics(),
        }
    }

    /// Run a read-only closure against the clock while holding the lock
    pub fn with_clock<R>(&self, f: impl FnOnce(&SimulationClock) -> R) -> R {
        f(&*self.clock.lock())
    }

    pub fn save_state(&self) -> Result<String, SimulationError> {
        self.clock.lock().save_state()
    }

    /// Run SMART vs FIFO on private clocks built from the live config
    pub fn run_comparison(&self, request: &ComparisonRequest) -> Result<ComparisonReport, SimulationError> {
        let config = self.clock.lock().config().clone();
        ComparisonHarness::new(config).run(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_drink_surfaces_error() {
        let shop = CoffeeShop::with_defaults().unwrap();
        assert!(matches!(
            shop.create_order("Frappuccino", None),
            Err(SimulationError::InvalidDrinkType(_))
        ));
        assert!(shop.queue_snapshot().is_empty());
    }

    #[test]
    fn test_snapshot_is_consistent() {
        let shop = CoffeeShop::with_defaults().unwrap();
        shop.trigger_rush_hour();
        shop.advance_one_minute().unwrap();

        let snapshot = shop.snapshot();
        let busy = snapshot.workers.iter().filter(|w| w.busy).count();
        assert_eq!(snapshot.queue.len(), snapshot.metrics.queue_length);
        assert_eq!(busy, snapshot.metrics.in_service);
        assert_eq!(
            snapshot.queue.len() + busy,
            snapshot.metrics.total_created as usize
        );
    }
}
