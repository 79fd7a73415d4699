//! Event logging for auditing and replay checks
//!
//! Every state change the clock makes is appended here in the order it
//! happens within a minute:
//! - **Arrival**: new order enters the queue
//! - **Assigned**: dispatcher hands an order to a barista
//! - **Completed**: barista finishes an order
//! - **Abandoned**: customer leaves after waiting past their timeout
//! - **FairnessViolation**: an order has been skipped more than the tolerance
//! - **Control**: mode switches, arrival toggles, rush batches
//!
//! # Example
//!
//! ```rust
//! use barista_simulator_core_rs::models::{Event, EventLog};
//!
//! let mut log = EventLog::new();
//! log.log(Event::OrderAbandoned { minute: 9, order_id: 4, waited_minutes: 9 });
//! assert_eq!(log.events_at_minute(9).len(), 1);
//! ```

use super::menu::{CustomerType, DrinkType};
use super::order::OrderId;
use crate::policy::QueueMode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    OrderArrived {
        minute: u32,
        order_id: OrderId,
        drink: DrinkType,
        customer: CustomerType,
    },

    OrderAssigned {
        minute: u32,
        order_id: OrderId,
        barista_id: usize,
        priority_score: f64,
        waited_minutes: u32,
    },

    OrderCompleted {
        minute: u32,
        order_id: OrderId,
        barista_id: usize,
        total_minutes: u32,
    },

    /// Abandonment and the complaint it causes are one outcome
    OrderAbandoned {
        minute: u32,
        order_id: OrderId,
        waited_minutes: u32,
    },

    FairnessViolation {
        minute: u32,
        order_id: OrderId,
        people_served_ahead: u32,
    },

    ModeSwitched {
        minute: u32,
        from: QueueMode,
        to: QueueMode,
    },

    AutoArrivalsToggled {
        minute: u32,
        enabled: bool,
        rate_per_minute: f64,
    },

    RushHour {
        minute: u32,
        orders_added: usize,
    },
}

impl Event {
    /// Minute at which the event happened
    pub fn minute(&self) -> u32 {
        match self {
            Event::OrderArrived { minute, .. }
            | Event::OrderAssigned { minute, .. }
            | Event::OrderCompleted { minute, .. }
            | Event::OrderAbandoned { minute, .. }
            | Event::FairnessViolation { minute, .. }
            | Event::ModeSwitched { minute, .. }
            | Event::AutoArrivalsToggled { minute, .. }
            | Event::RushHour { minute, .. } => *minute,
        }
    }

    /// Order the event concerns, if any
    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            Event::OrderArrived { order_id, .. }
            | Event::OrderAssigned { order_id, .. }
            | Event::OrderCompleted { order_id, .. }
            | Event::OrderAbandoned { order_id, .. }
            | Event::FairnessViolation { order_id, .. } => Some(*order_id),
            _ => None,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Event::OrderArrived { .. } => "OrderArrived",
            Event::OrderAssigned { .. } => "OrderAssigned",
            Event::OrderCompleted { .. } => "OrderCompleted",
            Event::OrderAbandoned { .. } => "OrderAbandoned",
            Event::FairnessViolation { .. } => "FairnessViolation",
            Event::ModeSwitched { .. } => "ModeSwitched",
            Event::AutoArrivalsToggled { .. } => "AutoArrivalsToggled",
            Event::RushHour { .. } => "RushHour",
        }
    }
}

/// Append-only event log
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events_at_minute(&self, minute: u32) -> Vec<&Event> {
        self.events.iter().filter(|e| e.minute() == minute).collect()
    }

    /// Full history of a single order
    pub fn events_for_order(&self, order_id: OrderId) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.order_id() == Some(order_id))
            .collect()
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    pub(crate) fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_for_order_keeps_order() {
        let mut log = EventLog::new();
        log.log(Event::OrderArrived {
            minute: 0,
            order_id: 1,
            drink: DrinkType::Latte,
            customer: CustomerType::Gold,
        });
        log.log(Event::RushHour {
            minute: 0,
            orders_added: 5,
        });
        log.log(Event::OrderAssigned {
            minute: 1,
            order_id: 1,
            barista_id: 0,
            priority_score: 0.5,
            waited_minutes: 1,
        });

        let history = log.events_for_order(1);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].event_type(), "OrderArrived");
        assert_eq!(history[1].event_type(), "OrderAssigned");
        assert_eq!(log.events_of_type("RushHour").len(), 1);
    }
}
