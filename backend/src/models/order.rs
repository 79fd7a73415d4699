//! Order model
//!
//! An order is one drink for one customer. It moves strictly forward
//! through its lifecycle:
//!
//! ```text
//! Queued ──assign──▶ InService ──prep done──▶ Completed
//!    │
//!    └──timeout──▶ Abandoned
//! ```
//!
//! The barista assignment lives inside the status variants, so a Queued or
//! Abandoned order cannot carry a barista id and an in-service one cannot
//! lack it.

use super::menu::{CustomerType, DrinkType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type OrderId = u64;

/// Order lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Waiting in the pending queue
    Queued,

    /// Being prepared
    InService {
        barista_id: usize,
        started_minute: u32,
    },

    /// Handed to the customer (terminal)
    Completed {
        barista_id: usize,
        started_minute: u32,
        completed_minute: u32,
    },

    /// Customer left before being served (terminal)
    Abandoned { minute: u32 },
}

impl OrderStatus {
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Queued => "Queued",
            OrderStatus::InService { .. } => "InService",
            OrderStatus::Completed { .. } => "Completed",
            OrderStatus::Abandoned { .. } => "Abandoned",
        }
    }
}

/// Coarse wait label shown next to each queued order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Urgency {
    #[default]
    Normal,
    Elevated,
    Urgent,
}

/// Errors raised by order construction and lifecycle transitions
#[derive(Debug, Error, PartialEq)]
pub enum OrderError {
    #[error("Invalid drink type: {0}")]
    InvalidDrinkType(String),

    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidTransition {
        order_id: OrderId,
        from: &'static str,
        to: &'static str,
    },
}

/// A single customer order
///
/// # Example
/// ```
/// use barista_simulator_core_rs::models::{CustomerType, DrinkType, Order};
///
/// let mut order = Order::new(1, DrinkType::Espresso, CustomerType::Regular, 0);
/// assert_eq!(order.prep_minutes(), 2);
///
/// order.start_service(0, 0).unwrap();
/// order.complete(2).unwrap();
/// assert_eq!(order.wait_minutes(), Some(0));
/// assert_eq!(order.total_minutes(), Some(2));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    drink: DrinkType,
    customer: CustomerType,
    arrival_minute: u32,
    status: OrderStatus,

    /// Last computed ranking score (refreshed every tick while queued)
    priority_score: f64,

    /// Last computed urgency label
    urgency: Urgency,

    /// Orders with later FIFO precedence that were started while this one waited
    people_served_ahead: u32,

    /// Set once `people_served_ahead` first exceeds the fairness tolerance
    fairness_flagged: bool,
}

impl Order {
    pub fn new(id: OrderId, drink: DrinkType, customer: CustomerType, arrival_minute: u32) -> Self {
        Self {
            id,
            drink,
            customer,
            arrival_minute,
            status: OrderStatus::Queued,
            priority_score: 0.0,
            urgency: Urgency::Normal,
            people_served_ahead: 0,
            fairness_flagged: false,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn drink(&self) -> DrinkType {
        self.drink
    }

    pub fn customer(&self) -> CustomerType {
        self.customer
    }

    pub fn arrival_minute(&self) -> u32 {
        self.arrival_minute
    }

    pub fn prep_minutes(&self) -> u32 {
        self.drink.prep_minutes()
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn priority_score(&self) -> f64 {
        self.priority_score
    }

    pub fn urgency(&self) -> Urgency {
        self.urgency
    }

    pub fn people_served_ahead(&self) -> u32 {
        self.people_served_ahead
    }

    pub fn fairness_flagged(&self) -> bool {
        self.fairness_flagged
    }

    pub fn is_queued(&self) -> bool {
        matches!(self.status, OrderStatus::Queued)
    }

    /// Barista preparing (or who prepared) this order
    pub fn assigned_barista(&self) -> Option<usize> {
        match self.status {
            OrderStatus::InService { barista_id, .. } | OrderStatus::Completed { barista_id, .. } => {
                Some(barista_id)
            }
            _ => None,
        }
    }

    /// FIFO precedence key: earlier arrival first, then lower id
    pub fn fifo_key(&self) -> (u32, OrderId) {
        (self.arrival_minute, self.id)
    }

    /// Minutes spent in the queue as of `now`
    pub fn minutes_waited(&self, now: u32) -> u32 {
        now.saturating_sub(self.arrival_minute)
    }

    /// True once the customer's patience is exhausted at `now`
    pub fn has_exceeded_timeout(&self, now: u32) -> bool {
        self.minutes_waited(now) > self.customer.timeout_minutes()
    }

    /// Service start minus arrival; defined once service has started
    pub fn wait_minutes(&self) -> Option<u32> {
        match self.status {
            OrderStatus::InService { started_minute, .. }
            | OrderStatus::Completed { started_minute, .. } => {
                Some(started_minute.saturating_sub(self.arrival_minute))
            }
            _ => None,
        }
    }

    /// Completion minus arrival; defined once completed
    pub fn total_minutes(&self) -> Option<u32> {
        match self.status {
            OrderStatus::Completed {
                completed_minute, ..
            } => Some(completed_minute.saturating_sub(self.arrival_minute)),
            _ => None,
        }
    }

    /// Abandoned, or served after waiting past the customer's timeout
    pub fn is_complaint(&self) -> bool {
        match self.status {
            OrderStatus::Abandoned { .. } => true,
            _ => self
                .wait_minutes()
                .map(|wait| wait > self.customer.timeout_minutes())
                .unwrap_or(false),
        }
    }

    pub(crate) fn set_priority(&mut self, score: f64, urgency: Urgency) {
        self.priority_score = score;
        self.urgency = urgency;
    }

    /// Count one more order started ahead of this one
    ///
    /// Returns `true` exactly once: on the skip that pushes the count past
    /// `tolerance`. Later skips keep counting but never re-flag.
    pub(crate) fn record_skip(&mut self, tolerance: u32) -> bool {
        self.people_served_ahead += 1;
        if !self.fairness_flagged && self.people_served_ahead > tolerance {
            self.fairness_flagged = true;
            return true;
        }
        false
    }

    pub fn start_service(&mut self, barista_id: usize, minute: u32) -> Result<(), OrderError> {
        match self.status {
            OrderStatus::Queued if minute >= self.arrival_minute => {
                self.status = OrderStatus::InService {
                    barista_id,
                    started_minute: minute,
                };
                Ok(())
            }
            _ => Err(self.transition_error("InService")),
        }
    }

    pub fn complete(&mut self, minute: u32) -> Result<(), OrderError> {
        match self.status {
            OrderStatus::InService {
                barista_id,
                started_minute,
            } if minute >= started_minute => {
                self.status = OrderStatus::Completed {
                    barista_id,
                    started_minute,
                    completed_minute: minute,
                };
                Ok(())
            }
            _ => Err(self.transition_error("Completed")),
        }
    }

    pub fn abandon(&mut self, minute: u32) -> Result<(), OrderError> {
        match self.status {
            OrderStatus::Queued => {
                self.status = OrderStatus::Abandoned { minute };
                Ok(())
            }
            _ => Err(self.transition_error("Abandoned")),
        }
    }

    fn transition_error(&self, to: &'static str) -> OrderError {
        OrderError::InvalidTransition {
            order_id: self.id,
            from: self.status.label(),
            to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_backward_transitions() {
        let mut order = Order::new(1, DrinkType::Latte, CustomerType::Gold, 0);
        order.start_service(2, 3).unwrap();
        assert!(order.abandon(4).is_err());
        order.complete(7).unwrap();
        assert!(order.start_service(1, 8).is_err());
        assert!(order.complete(9).is_err());
    }

    #[test]
    fn test_record_skip_flags_once() {
        let mut order = Order::new(1, DrinkType::Mocha, CustomerType::New, 0);
        assert!(!order.record_skip(2));
        assert!(!order.record_skip(2));
        assert!(order.record_skip(2));
        assert!(!order.record_skip(2));
        assert!(!order.record_skip(2));
        assert_eq!(order.people_served_ahead(), 5);
        assert!(order.fairness_flagged());
    }

    #[test]
    fn test_timeout_is_strictly_greater() {
        let order = Order::new(1, DrinkType::Espresso, CustomerType::New, 0);
        assert!(!order.has_exceeded_timeout(8));
        assert!(order.has_exceeded_timeout(9));
    }

    #[test]
    fn test_queued_order_has_no_barista() {
        let order = Order::new(3, DrinkType::ColdBrew, CustomerType::Regular, 5);
        assert_eq!(order.assigned_barista(), None);
        assert_eq!(order.wait_minutes(), None);
    }
}
