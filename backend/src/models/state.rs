//! Simulation State
//!
//! One explicit value holding everything that changes while the counter
//! runs: the minute clock, the pending queue, the baristas, and the logs of
//! finished orders.
//!
//! # Critical Invariants
//!
//! 1. **Conservation**: every order ever created is in exactly one of the
//!    pending queue, a barista's hands, the completed log or the abandoned log
//! 2. **Queue purity**: the pending queue holds only Queued orders
//! 3. **Id monotonicity**: order ids are assigned 1, 2, 3, ... and never reused
//!    until reset

use super::menu::{CustomerType, DrinkType};
use super::order::{Order, OrderId, OrderStatus};
use crate::arrivals::ArrivalMode;
use crate::core::time::TimeManager;
use crate::policy::QueueMode;
use crate::pool::WorkerPool;
use std::collections::BTreeSet;

/// Complete simulation state
///
/// # Example
///
/// ```rust
/// use barista_simulator_core_rs::arrivals::ArrivalMode;
/// use barista_simulator_core_rs::models::{CustomerType, DrinkType, SimulationState};
/// use barista_simulator_core_rs::policy::QueueMode;
/// use barista_simulator_core_rs::pool::WorkerPool;
///
/// let mut state = SimulationState::new(
///     WorkerPool::with_default_names(3),
///     QueueMode::Smart,
///     ArrivalMode::Manual,
/// );
/// let id = state.enqueue(DrinkType::Latte, CustomerType::Gold);
/// assert_eq!(id, 1);
/// assert_eq!(state.queue_len(), 1);
/// assert!(state.check_conservation().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct SimulationState {
    time: TimeManager,
    pending: Vec<Order>,
    pool: WorkerPool,
    completed: Vec<Order>,
    abandoned: Vec<Order>,
    mode: QueueMode,
    arrival_mode: ArrivalMode,
    next_order_id: OrderId,
}

impl SimulationState {
    pub fn new(pool: WorkerPool, mode: QueueMode, arrival_mode: ArrivalMode) -> Self {
        Self {
            time: TimeManager::new(),
            pending: Vec::new(),
            pool,
            completed: Vec::new(),
            abandoned: Vec::new(),
            mode,
            arrival_mode,
            next_order_id: 1,
        }
    }

    /// Reassemble a state from checkpointed parts (no validation)
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        current_minute: u32,
        pending: Vec<Order>,
        pool: WorkerPool,
        completed: Vec<Order>,
        abandoned: Vec<Order>,
        mode: QueueMode,
        arrival_mode: ArrivalMode,
        next_order_id: OrderId,
    ) -> Self {
        Self {
            time: TimeManager::at_minute(current_minute),
            pending,
            pool,
            completed,
            abandoned,
            mode,
            arrival_mode,
            next_order_id,
        }
    }

    pub fn current_minute(&self) -> u32 {
        self.time.current_minute()
    }

    pub(crate) fn advance_minute(&mut self) {
        self.time.advance_minute();
    }

    pub fn mode(&self) -> QueueMode {
        self.mode
    }

    pub(crate) fn set_mode(&mut self, mode: QueueMode) {
        self.mode = mode;
    }

    pub fn arrival_mode(&self) -> ArrivalMode {
        self.arrival_mode
    }

    pub(crate) fn set_arrival_mode(&mut self, mode: ArrivalMode) {
        self.arrival_mode = mode;
    }

    /// Create a Queued order stamped with the current minute
    pub fn enqueue(&mut self, drink: DrinkType, customer: CustomerType) -> OrderId {
        let id = self.next_order_id;
        self.next_order_id += 1;
        self.pending
            .push(Order::new(id, drink, customer, self.current_minute()));
        id
    }

    pub fn pending(&self) -> &[Order] {
        &self.pending
    }

    pub(crate) fn pending_mut(&mut self) -> &mut Vec<Order> {
        &mut self.pending
    }

    pub fn queue_len(&self) -> usize {
        self.pending.len()
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub(crate) fn pool_mut(&mut self) -> &mut WorkerPool {
        &mut self.pool
    }

    /// Split borrow used by the dispatcher
    pub(crate) fn queue_and_pool_mut(&mut self) -> (&mut Vec<Order>, &mut WorkerPool, u32) {
        let minute = self.time.current_minute();
        (&mut self.pending, &mut self.pool, minute)
    }

    /// Completed orders in completion order
    pub fn completed(&self) -> &[Order] {
        &self.completed
    }

    pub(crate) fn push_completed(&mut self, order: Order) {
        self.completed.push(order);
    }

    /// Abandoned orders in abandonment order
    pub fn abandoned(&self) -> &[Order] {
        &self.abandoned
    }

    pub(crate) fn push_abandoned(&mut self, order: Order) {
        self.abandoned.push(order);
    }

    /// Remove and return queued orders whose customer has run out of patience
    pub(crate) fn take_expired(&mut self, now: u32) -> Vec<Order> {
        let (expired, waiting): (Vec<Order>, Vec<Order>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|order| order.has_exceeded_timeout(now));
        self.pending = waiting;
        expired
    }

    /// Number of orders ever created since start or last reset
    pub fn total_created(&self) -> u64 {
        self.next_order_id - 1
    }

    pub fn next_order_id(&self) -> OrderId {
        self.next_order_id
    }

    /// Look up an order wherever it currently lives
    pub fn find_order(&self, id: OrderId) -> Option<&Order> {
        self.pending
            .iter()
            .chain(self.pool.in_service())
            .chain(self.completed.iter())
            .chain(self.abandoned.iter())
            .find(|order| order.id() == id)
    }

    /// Every order, wherever it lives
    pub fn all_orders(&self) -> impl Iterator<Item = &Order> {
        self.pending
            .iter()
            .chain(self.pool.in_service())
            .chain(self.completed.iter())
            .chain(self.abandoned.iter())
    }

    /// Verify conservation, queue purity and id uniqueness
    pub fn check_conservation(&self) -> Result<(), String> {
        let located = self.pending.len()
            + self.pool.busy_count()
            + self.completed.len()
            + self.abandoned.len();
        if located as u64 != self.total_created() {
            return Err(format!(
                "Conservation violated: {} orders located, {} created",
                located,
                self.total_created()
            ));
        }

        let mut seen = BTreeSet::new();
        for order in self.all_orders() {
            if !seen.insert(order.id()) {
                return Err(format!("Order {} appears in more than one place", order.id()));
            }
            if order.id() == 0 || order.id() >= self.next_order_id {
                return Err(format!("Order {} was never issued", order.id()));
            }
        }

        if let Some(order) = self.pending.iter().find(|o| !o.is_queued()) {
            return Err(format!(
                "Order {} is {} but still in the pending queue",
                order.id(),
                order.status().label()
            ));
        }
        if let Some(order) = self
            .completed
            .iter()
            .find(|o| !matches!(o.status(), OrderStatus::Completed { .. }))
        {
            return Err(format!("Order {} in completed log is {}", order.id(), order.status().label()));
        }
        if let Some(order) = self
            .abandoned
            .iter()
            .find(|o| !matches!(o.status(), OrderStatus::Abandoned { .. }))
        {
            return Err(format!("Order {} in abandoned log is {}", order.id(), order.status().label()));
        }

        Ok(())
    }

    /// Discard all orders and worker progress and return to minute zero
    pub(crate) fn reset(&mut self, mode: QueueMode, arrival_mode: ArrivalMode) {
        self.time.reset();
        self.pending.clear();
        self.pool.reset();
        self.completed.clear();
        self.abandoned.clear();
        self.mode = mode;
        self.arrival_mode = arrival_mode;
        self.next_order_id = 1;
    }
}
