//! Barista (worker) model
//!
//! Each barista is a two-state machine:
//!
//! ```text
//! Free ──assign(order)──▶ Busy ──tick() until remaining hits 0──▶ Free
//! ```
//!
//! A busy barista owns the order it is preparing; the order leaves the
//! barista only when it completes.

use super::order::{Order, OrderError, OrderId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaristaStatus {
    Free,
    Busy,
}

/// Errors from barista state transitions
///
/// These indicate a scheduling bug rather than a user-facing condition.
#[derive(Debug, Error, PartialEq)]
pub enum BaristaError {
    #[error("Barista {barista_id} is busy with order {current_order_id}; cannot take order {order_id}")]
    AlreadyBusy {
        barista_id: usize,
        current_order_id: OrderId,
        order_id: OrderId,
    },

    #[error("No barista with id {barista_id}")]
    UnknownBarista { barista_id: usize },

    #[error("No free barista for order {order_id}")]
    NoneFree { order_id: OrderId },

    #[error(transparent)]
    Order(#[from] OrderError),
}

/// A server at the counter
///
/// # Example
/// ```
/// use barista_simulator_core_rs::models::{Barista, CustomerType, DrinkType, Order};
///
/// let mut barista = Barista::new(0, "Barista 1".to_string());
/// barista.assign(Order::new(1, DrinkType::Espresso, CustomerType::Gold, 0), 0).unwrap();
/// assert_eq!(barista.remaining_minutes(), 2);
///
/// assert!(barista.tick(1).unwrap().is_none());
/// let done = barista.tick(2).unwrap().unwrap();
/// assert_eq!(done.total_minutes(), Some(2));
/// assert!(barista.is_free());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Barista {
    id: usize,
    name: String,

    /// Order being prepared; `Some` iff busy
    current_order: Option<Order>,

    /// Minutes left on the current order; zero iff free
    remaining_minutes: u32,

    /// Sum of prep minutes of every completed order
    total_work_minutes: u32,

    orders_completed: u32,
}

impl Barista {
    pub fn new(id: usize, name: String) -> Self {
        Self {
            id,
            name,
            current_order: None,
            remaining_minutes: 0,
            total_work_minutes: 0,
            orders_completed: 0,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> BaristaStatus {
        if self.current_order.is_some() {
            BaristaStatus::Busy
        } else {
            BaristaStatus::Free
        }
    }

    pub fn is_free(&self) -> bool {
        self.current_order.is_none()
    }

    pub fn current_order(&self) -> Option<&Order> {
        self.current_order.as_ref()
    }

    pub fn current_order_id(&self) -> Option<OrderId> {
        self.current_order.as_ref().map(Order::id)
    }

    pub fn remaining_minutes(&self) -> u32 {
        self.remaining_minutes
    }

    pub fn total_work_minutes(&self) -> u32 {
        self.total_work_minutes
    }

    pub fn orders_completed(&self) -> u32 {
        self.orders_completed
    }

    /// Average prep minutes per completed order (0 before the first one)
    pub fn average_minutes_per_order(&self) -> f64 {
        if self.orders_completed == 0 {
            0.0
        } else {
            self.total_work_minutes as f64 / self.orders_completed as f64
        }
    }

    /// Start preparing `order` at `minute`
    pub fn assign(&mut self, mut order: Order, minute: u32) -> Result<(), BaristaError> {
        if let Some(current) = &self.current_order {
            return Err(BaristaError::AlreadyBusy {
                barista_id: self.id,
                current_order_id: current.id(),
                order_id: order.id(),
            });
        }

        order.start_service(self.id, minute)?;
        self.remaining_minutes = order.prep_minutes();
        self.current_order = Some(order);
        Ok(())
    }

    /// Work one minute; returns the order if it finished at `minute`
    ///
    /// Fails if the held order cannot complete at `minute`. The order stays
    /// with the barista in that case.
    pub fn tick(&mut self, minute: u32) -> Result<Option<Order>, BaristaError> {
        let Some(order) = self.current_order.as_mut() else {
            return Ok(None);
        };

        self.remaining_minutes = self.remaining_minutes.saturating_sub(1);
        if self.remaining_minutes > 0 {
            return Ok(None);
        }

        order.complete(minute)?;
        self.total_work_minutes += order.prep_minutes();
        self.orders_completed += 1;
        Ok(self.current_order.take())
    }

    /// Drop any in-flight order and zero the counters
    pub(crate) fn reset(&mut self) {
        self.current_order = None;
        self.remaining_minutes = 0;
        self.total_work_minutes = 0;
        self.orders_completed = 0;
    }
}
