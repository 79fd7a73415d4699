//! Priority Policy Module
//!
//! A priority policy turns a queued order and the current minute into a
//! score. The dispatcher serves the highest score first.
//!
//! # Policy Interface
//!
//! All policies implement the `PriorityPolicy` trait:
//! ```rust
//! use barista_simulator_core_rs::models::Order;
//! use barista_simulator_core_rs::policy::{PriorityPolicy, PriorityScore, QueueMode};
//!
//! struct ShortestFirst;
//!
//! impl PriorityPolicy for ShortestFirst {
//!     fn mode(&self) -> QueueMode {
//!         QueueMode::Smart
//!     }
//!
//!     fn score(&self, order: &Order, now: u32) -> PriorityScore {
//!         PriorityScore {
//!             value: -(order.prep_minutes() as f64),
//!             urgency: Default::default(),
//!         }
//!     }
//! }
//! ```
//!
//! Available policies:
//! 1. **Fifo**: earliest arrival first (baseline)
//! 2. **Smart**: weighted blend of wait, customer tier, job length and
//!    fairness

use crate::models::{CustomerType, Order, Urgency};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

pub mod fifo;
pub mod smart;

pub use fifo::FifoPolicy;
pub use smart::SmartPolicy;

/// Which ranking the dispatcher consults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueueMode {
    Fifo,
    Smart,
}

impl fmt::Display for QueueMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueMode::Fifo => f.write_str("FIFO"),
            QueueMode::Smart => f.write_str("SMART"),
        }
    }
}

impl FromStr for QueueMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fifo" => Ok(QueueMode::Fifo),
            "smart" => Ok(QueueMode::Smart),
            other => Err(format!("unknown queue mode '{}'", other)),
        }
    }
}

/// Result of scoring one order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorityScore {
    /// Higher is served first
    pub value: f64,
    pub urgency: Urgency,
}

/// Wait thresholds (minutes, exclusive) for the urgency label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrgencyThresholds {
    /// Waits longer than this are Elevated
    pub elevated_after: u32,
    /// Waits longer than this are Urgent
    pub urgent_after: u32,
}

impl Default for UrgencyThresholds {
    fn default() -> Self {
        Self {
            elevated_after: 4,
            urgent_after: 8,
        }
    }
}

impl UrgencyThresholds {
    pub fn classify(&self, waited_minutes: u32) -> Urgency {
        if waited_minutes > self.urgent_after {
            Urgency::Urgent
        } else if waited_minutes > self.elevated_after {
            Urgency::Elevated
        } else {
            Urgency::Normal
        }
    }
}

/// Component weights of the SMART score
///
/// Each component is normalized to [0, 1] before weighting, so with weights
/// summing to 1.0 the score is also in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmartWeights {
    pub wait: f64,
    pub tier: f64,
    pub short_job: f64,
    pub fairness: f64,
}

impl Default for SmartWeights {
    fn default() -> Self {
        Self {
            wait: 0.40,
            tier: 0.25,
            short_job: 0.10,
            fairness: 0.25,
        }
    }
}

impl SmartWeights {
    pub fn total(&self) -> f64 {
        self.wait + self.tier + self.short_job + self.fairness
    }

    pub(crate) fn as_array(&self) -> [f64; 4] {
        [self.wait, self.tier, self.short_job, self.fairness]
    }
}

/// Per-tier value fed into the SMART tier component (each in [0, 1])
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierValues {
    pub gold: f64,
    pub regular: f64,
    pub new: f64,
}

impl Default for TierValues {
    fn default() -> Self {
        Self {
            gold: 1.0,
            regular: 0.5,
            new: 0.0,
        }
    }
}

impl TierValues {
    pub fn value_for(&self, customer: CustomerType) -> f64 {
        match customer {
            CustomerType::Gold => self.gold,
            CustomerType::Regular => self.regular,
            CustomerType::New => self.new,
        }
    }
}

/// Every tunable that shapes ranking and fairness accounting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicySettings {
    pub weights: SmartWeights,
    pub tier_values: TierValues,
    pub urgency: UrgencyThresholds,

    /// Wait at which the SMART wait component saturates
    pub wait_horizon_minutes: u32,

    /// Skips an order may absorb before it counts as a fairness violation
    pub fairness_tolerance: u32,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            weights: SmartWeights::default(),
            tier_values: TierValues::default(),
            urgency: UrgencyThresholds::default(),
            wait_horizon_minutes: 10,
            fairness_tolerance: 3,
        }
    }
}

/// Ranking function consulted by the dispatcher
pub trait PriorityPolicy: Send + Sync {
    fn mode(&self) -> QueueMode;

    /// Score `order` as of minute `now`
    fn score(&self, order: &Order, now: u32) -> PriorityScore;
}

/// Construct the policy for `mode`
pub fn build_policy(mode: QueueMode, settings: &PolicySettings) -> Box<dyn PriorityPolicy> {
    match mode {
        QueueMode::Fifo => Box::new(FifoPolicy::new(settings.urgency)),
        QueueMode::Smart => Box::new(SmartPolicy::new(*settings)),
    }
}

/// Ranking order: higher score first, then earlier arrival, then lower id
pub fn compare_ranked(a: &Order, a_score: f64, b: &Order, b_score: f64) -> Ordering {
    b_score
        .total_cmp(&a_score)
        .then_with(|| a.fifo_key().cmp(&b.fifo_key()))
}

/// Short explanation of why an order sits where it does
pub fn priority_reason(order: &Order, now: u32, settings: &PolicySettings) -> String {
    let waited = order.minutes_waited(now);
    let timeout = order.customer().timeout_minutes();

    let mut reason = match settings.urgency.classify(waited) {
        Urgency::Urgent => format!("Urgent - waiting {} min", waited),
        Urgency::Elevated => format!(
            "Approaching timeout - {} min remaining",
            timeout.saturating_sub(waited)
        ),
        Urgency::Normal if order.customer() == CustomerType::Gold => "Gold member".to_string(),
        Urgency::Normal if order.prep_minutes() <= 2 => "Quick order".to_string(),
        Urgency::Normal => "Standard priority".to_string(),
    };

    if order.people_served_ahead() > 0 {
        reason.push_str(&format!(" | Skipped {} times", order.people_served_ahead()));
    }
    reason
}
