//! FIFO (First-In-First-Out) Policy
//!
//! Baseline policy: the oldest order is always served first.
//!
//! # Behavior
//!
//! - Score is the negated arrival minute, so earlier arrivals rank higher
//! - Same-minute arrivals fall back to the id tie-break (creation order)
//! - Urgency is computed for display only and never affects ranking
//!
//! # Use Case
//!
//! - Baseline for comparison with the SMART policy

use super::{PriorityPolicy, PriorityScore, QueueMode, UrgencyThresholds};
use crate::models::Order;

/// FIFO policy: earliest arrival wins
///
/// # Example
///
/// ```
/// use barista_simulator_core_rs::models::{CustomerType, DrinkType, Order};
/// use barista_simulator_core_rs::policy::{FifoPolicy, PriorityPolicy};
///
/// let policy = FifoPolicy::default();
/// let early = Order::new(1, DrinkType::Mocha, CustomerType::New, 2);
/// let late = Order::new(2, DrinkType::ColdBrew, CustomerType::Gold, 5);
///
/// assert!(policy.score(&early, 6).value > policy.score(&late, 6).value);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FifoPolicy {
    urgency: UrgencyThresholds,
}

impl FifoPolicy {
    pub fn new(urgency: UrgencyThresholds) -> Self {
        Self { urgency }
    }
}

impl PriorityPolicy for FifoPolicy {
    fn mode(&self) -> QueueMode {
        QueueMode::Fifo
    }

    fn score(&self, order: &Order, now: u32) -> PriorityScore {
        PriorityScore {
            value: -(order.arrival_minute() as f64),
            urgency: self.urgency.classify(order.minutes_waited(now)),
        }
    }
}
