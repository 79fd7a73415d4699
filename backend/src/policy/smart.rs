//! SMART Policy
//!
//! Weighted blend of four normalized components:
//!
//! | Component | Default weight | Normalization |
//! |---|---|---|
//! | Wait | 0.40 | waited / wait horizon, capped at 1 |
//! | Customer tier | 0.25 | configured tier value |
//! | Short job | 0.10 | shortest prep on menu / this prep |
//! | Fairness | 0.25 | skips / tolerance, capped at 1 |
//!
//! The fairness term rises with every skip, and the wait term rises with
//! every minute, so a passed-over order climbs the ranking until it is
//! served or its customer leaves.

use super::{PolicySettings, PriorityPolicy, PriorityScore, QueueMode};
use crate::models::{DrinkType, Order};

/// SMART policy
///
/// # Example
///
/// ```
/// use barista_simulator_core_rs::models::{CustomerType, DrinkType, Order};
/// use barista_simulator_core_rs::policy::{PolicySettings, PriorityPolicy, SmartPolicy};
///
/// let policy = SmartPolicy::new(PolicySettings::default());
/// let gold = Order::new(1, DrinkType::Espresso, CustomerType::Gold, 0);
/// let new = Order::new(2, DrinkType::Espresso, CustomerType::New, 0);
///
/// assert!(policy.score(&gold, 0).value > policy.score(&new, 0).value);
/// ```
#[derive(Debug, Clone)]
pub struct SmartPolicy {
    settings: PolicySettings,
}

/// Normalized component values before weighting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmartComponents {
    pub wait: f64,
    pub tier: f64,
    pub short_job: f64,
    pub fairness: f64,
}

impl SmartPolicy {
    pub fn new(settings: PolicySettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &PolicySettings {
        &self.settings
    }

    /// Component breakdown of an order's score at `now`
    pub fn components(&self, order: &Order, now: u32) -> SmartComponents {
        let waited = order.minutes_waited(now) as f64;
        let horizon = self.settings.wait_horizon_minutes.max(1) as f64;

        let skips = order.people_served_ahead() as f64;
        let fairness = match self.settings.fairness_tolerance {
            0 if skips > 0.0 => 1.0,
            0 => 0.0,
            tolerance => (skips / tolerance as f64).min(1.0),
        };

        SmartComponents {
            wait: (waited / horizon).min(1.0),
            tier: self.settings.tier_values.value_for(order.customer()),
            short_job: DrinkType::shortest_prep_minutes() as f64 / order.prep_minutes() as f64,
            fairness,
        }
    }
}

impl PriorityPolicy for SmartPolicy {
    fn mode(&self) -> QueueMode {
        QueueMode::Smart
    }

    fn score(&self, order: &Order, now: u32) -> PriorityScore {
        let c = self.components(order, now);
        let w = &self.settings.weights;

        PriorityScore {
            value: w.wait * c.wait + w.tier * c.tier + w.short_job * c.short_job + w.fairness * c.fairness,
            urgency: self.settings.urgency.classify(order.minutes_waited(now)),
        }
    }
}
