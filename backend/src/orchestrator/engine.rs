//! Orchestrator Engine
//!
//! Main simulation loop integrating all components:
//! - Order arrivals (manual, rush batches, Poisson per minute)
//! - Service progress (worker pool)
//! - Dispatch (policy ranking, fairness accounting)
//! - Abandonment (customer timeouts)
//! - Event logging (complete simulation history)
//!
//! # Architecture
//!
//! ```text
//! For each minute m:
//! 1. Admit Poisson arrivals (if auto arrivals are on), stamped m
//! 2. Tick the worker pool; orders finishing now are Completed at m
//! 3. Dispatch ranked, still-eligible orders to free baristas
//! 4. Abandon queued orders whose wait exceeds their customer's timeout
//! 5. Advance to m + 1
//! ```
//!
//! Manual commands (`create_order`, `add_random_order`, `trigger_rush_hour`)
//! enqueue at the current minute and are dispatched by the next tick.
//!
//! # Example
//!
//! ```rust
//! use barista_simulator_core_rs::models::DrinkType;
//! use barista_simulator_core_rs::orchestrator::{EngineConfig, SimulationClock};
//!
//! let mut clock = SimulationClock::new(EngineConfig::default()).unwrap();
//! let order = clock.create_order(DrinkType::Espresso, None);
//!
//! for _ in 0..3 {
//!     let result = clock.advance_one_minute().unwrap();
//!     println!("Minute {}: {} completed", result.minute, result.completions.len());
//! }
//!
//! let done = clock.state().find_order(order.id()).unwrap();
//! assert_eq!(done.total_minutes(), Some(2));
//! ```

use crate::arrivals::{validate_rate, ArrivalConfig, ArrivalError, ArrivalGenerator, ArrivalMode, DEFAULT_ARRIVAL_RATE};
use crate::dispatch::{Assignment, Dispatcher};
use crate::metrics::{
    worker_breakdown, AnalyticsReport, MetricsAggregator, MetricsSnapshot, WorkerBreakdown, WorkloadThresholds,
    DEFAULT_ROLLING_WINDOW,
};
use crate::models::barista::BaristaError;
use crate::models::event::{Event, EventLog};
use crate::models::menu::{CustomerType, DrinkType};
use crate::models::order::{Order, OrderError, OrderId, Urgency};
use crate::models::state::SimulationState;
use crate::orchestrator::checkpoint::{compute_config_hash, validate_snapshot, StateSnapshot};
use crate::policy::{priority_reason, PolicySettings, QueueMode};
use crate::pool::{default_names, WorkerPool};
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Configuration Types
// ============================================================================

/// Complete engine configuration
///
/// Every tunable of the counter lives here so that two clocks built from
/// equal configs behave identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of baristas
    pub worker_count: usize,

    /// Display names; defaults to "Barista 1", "Barista 2", ...
    pub barista_names: Option<Vec<String>>,

    /// Ranking in force at start and after reset
    pub initial_mode: QueueMode,

    /// Arrival mode at start and after reset
    pub arrival_mode: ArrivalMode,

    /// Rate used when auto arrivals are enabled without an explicit rate
    pub default_arrival_rate: f64,

    /// RNG seed for deterministic simulation
    pub rng_seed: u64,

    /// SMART weights, tier values, urgency thresholds, fairness tolerance
    pub policy: PolicySettings,

    /// Frequency tables for random orders
    pub arrivals: ArrivalConfig,

    pub workload: WorkloadThresholds,

    /// Completed orders kept for windowed statistics
    pub rolling_window: usize,

    /// Inclusive bounds of a rush batch
    pub rush_size: (u32, u32),
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_count: 3,
            barista_names: None,
            initial_mode: QueueMode::Smart,
            arrival_mode: ArrivalMode::Manual,
            default_arrival_rate: DEFAULT_ARRIVAL_RATE,
            rng_seed: 42,
            policy: PolicySettings::default(),
            arrivals: ArrivalConfig::default(),
            workload: WorkloadThresholds::default(),
            rolling_window: DEFAULT_ROLLING_WINDOW,
            rush_size: (5, 8),
        }
    }
}

impl EngineConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.worker_count == 0 {
            return Err(SimulationError::InvalidConfig(
                "worker_count must be at least 1".to_string(),
            ));
        }

        if let Some(names) = &self.barista_names {
            if names.len() != self.worker_count {
                return Err(SimulationError::InvalidConfig(format!(
                    "{} barista names given for {} workers",
                    names.len(),
                    self.worker_count
                )));
            }
        }

        let weights = self.policy.weights.as_array();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(SimulationError::InvalidConfig(
                "SMART weights must be finite and non-negative".to_string(),
            ));
        }
        if self.policy.weights.total() <= 0.0 {
            return Err(SimulationError::InvalidConfig(
                "SMART weights must not all be zero".to_string(),
            ));
        }

        let tiers = &self.policy.tier_values;
        if [tiers.gold, tiers.regular, tiers.new]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(SimulationError::InvalidConfig(
                "tier values must be finite and non-negative".to_string(),
            ));
        }

        if self.policy.urgency.elevated_after > self.policy.urgency.urgent_after {
            return Err(SimulationError::InvalidConfig(format!(
                "elevated threshold {} is above urgent threshold {}",
                self.policy.urgency.elevated_after, self.policy.urgency.urgent_after
            )));
        }

        if self.policy.wait_horizon_minutes == 0 {
            return Err(SimulationError::InvalidConfig(
                "wait_horizon_minutes must be at least 1".to_string(),
            ));
        }

        validate_rate(self.default_arrival_rate)?;
        if let ArrivalMode::Poisson { rate_per_minute } = self.arrival_mode {
            validate_rate(rate_per_minute)?;
        }
        self.arrivals.validate()?;

        let (min, max) = self.rush_size;
        if min == 0 || min > max {
            return Err(SimulationError::InvalidConfig(format!(
                "rush_size bounds ({}, {}) must satisfy 1 <= min <= max",
                min, max
            )));
        }

        if self.rolling_window == 0 {
            return Err(SimulationError::InvalidConfig(
                "rolling_window must be at least 1".to_string(),
            ));
        }

        let workload = &self.workload;
        if !workload.overload_ratio.is_finite()
            || !workload.underutilized_ratio.is_finite()
            || workload.underutilized_ratio > workload.overload_ratio
        {
            return Err(SimulationError::InvalidConfig(
                "workload thresholds must be finite with underutilized <= overload".to_string(),
            ));
        }

        Ok(())
    }

    fn barista_names(&self) -> Vec<String> {
        self.barista_names
            .clone()
            .unwrap_or_else(|| default_names(self.worker_count))
    }
}

// ============================================================================
// Results and Errors
// ============================================================================

/// Summary of one simulated minute
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickResult {
    /// Minute that was processed
    pub minute: u32,

    /// Orders admitted by Poisson arrivals this minute
    pub arrivals: Vec<OrderId>,

    /// Orders handed to baristas this minute
    pub assignments: Vec<Assignment>,

    /// Orders finished this minute
    pub completions: Vec<OrderId>,

    /// Orders whose customer left this minute
    pub abandonments: Vec<OrderId>,

    /// Orders newly flagged for being skipped past the tolerance
    pub fairness_flags: Vec<OrderId>,

    /// Pending queue length after the tick
    pub queue_length: usize,
}

/// Simulation error types
#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    InvalidDrinkType(#[from] OrderError),

    #[error("Invalid arrival rate: {0}")]
    InvalidArrivalRate(f64),

    /// Scheduling invariant broken; indicates a bug, never user input
    #[error("Invariant violated: {0}")]
    Invariant(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Config mismatch: expected hash {expected}, got {actual}")]
    ConfigMismatch { expected: String, actual: String },

    #[error("State validation failed: {0}")]
    StateValidationError(String),
}

impl From<BaristaError> for SimulationError {
    fn from(err: BaristaError) -> Self {
        SimulationError::Invariant(err.to_string())
    }
}

impl From<ArrivalError> for SimulationError {
    fn from(err: ArrivalError) -> Self {
        match err {
            ArrivalError::InvalidRate(rate) => SimulationError::InvalidArrivalRate(rate),
            other => SimulationError::InvalidConfig(other.to_string()),
        }
    }
}

/// One queued order as seen from the counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedOrderView {
    /// 1-based position in the current ranking
    pub rank: usize,
    pub order_id: OrderId,
    pub drink: DrinkType,
    pub customer: CustomerType,
    pub arrival_minute: u32,
    pub waited_minutes: u32,
    pub priority_score: f64,
    pub urgency: Urgency,
    pub estimated_wait_minutes: f64,
    pub people_served_ahead: u32,
    pub priority_reason: String,
}

// ============================================================================
// Simulation Clock
// ============================================================================

/// Single-owner driver of one counter
///
/// # Determinism
///
/// All randomness goes through one seeded `RngManager`. Same config and
/// same command sequence give identical state, events and metrics.
#[derive(Debug)]
pub struct SimulationClock {
    config: EngineConfig,
    state: SimulationState,
    rng: RngManager,
    dispatcher: Dispatcher,
    generator: ArrivalGenerator,
    metrics: MetricsAggregator,
    event_log: EventLog,
}

impl SimulationClock {
    /// Create a clock at minute zero with an empty queue
    pub fn new(config: EngineConfig) -> Result<Self, SimulationError> {
        config.validate()?;

        let pool = WorkerPool::new(config.barista_names());
        let state = SimulationState::new(pool, config.initial_mode, config.arrival_mode);

        Ok(Self {
            rng: RngManager::new(config.rng_seed),
            dispatcher: Dispatcher::new(config.initial_mode, config.policy),
            generator: ArrivalGenerator::new(&config.arrivals),
            metrics: MetricsAggregator::new(config.rolling_window),
            event_log: EventLog::new(),
            state,
            config,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn current_minute(&self) -> u32 {
        self.state.current_minute()
    }

    pub fn mode(&self) -> QueueMode {
        self.state.mode()
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    pub fn aggregator(&self) -> &MetricsAggregator {
        &self.metrics
    }

    /// Current RNG state (for checkpointing and replay checks)
    pub fn rng_state(&self) -> u64 {
        self.rng.get_state()
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Enqueue one order at the current minute
    ///
    /// A missing customer type is drawn from the customer frequency table.
    pub fn create_order(&mut self, drink: DrinkType, customer: Option<CustomerType>) -> Order {
        let customer = match customer {
            Some(customer) => customer,
            None => self.generator.sample_customer(&mut self.rng),
        };
        self.admit(drink, customer)
    }

    /// Like `create_order`, parsing the drink from its menu name
    pub fn create_order_named(
        &mut self,
        drink: &str,
        customer: Option<CustomerType>,
    ) -> Result<Order, SimulationError> {
        let drink: DrinkType = drink.parse()?;
        Ok(self.create_order(drink, customer))
    }

    /// Enqueue one order with drink and customer drawn from the frequency tables
    pub fn add_random_order(&mut self) -> Order {
        let drink = self.generator.sample_drink(&mut self.rng);
        let customer = self.generator.sample_customer(&mut self.rng);
        self.admit(drink, customer)
    }

    /// Enqueue a burst of random orders; returns how many were added
    pub fn trigger_rush_hour(&mut self) -> usize {
        let size = self
            .generator
            .sample_rush_size(self.config.rush_size, &mut self.rng) as usize;
        for _ in 0..size {
            self.add_random_order();
        }

        let minute = self.current_minute();
        self.event_log.log(Event::RushHour {
            minute,
            orders_added: size,
        });
        tracing::info!(minute, orders = size, "rush hour");
        size
    }

    /// Consult `mode` from the next dispatch on; queue and history are kept
    pub fn switch_mode(&mut self, mode: QueueMode) {
        let from = self.state.mode();
        if from == mode {
            return;
        }

        self.dispatcher.set_mode(mode);
        self.state.set_mode(mode);

        let minute = self.current_minute();
        self.event_log.log(Event::ModeSwitched { minute, from, to: mode });
        tracing::info!(minute, %from, to = %mode, "queue mode switched");
    }

    /// Turn per-minute Poisson arrivals on or off
    ///
    /// Enabling without a rate reuses the configured default rate.
    pub fn toggle_auto_arrivals(&mut self, enabled: bool, rate: Option<f64>) -> Result<(), SimulationError> {
        let rate = rate.unwrap_or(self.config.default_arrival_rate);
        let mode = if enabled {
            validate_rate(rate)?;
            ArrivalMode::Poisson { rate_per_minute: rate }
        } else {
            ArrivalMode::Manual
        };

        if mode == self.state.arrival_mode() {
            return Ok(());
        }
        self.state.set_arrival_mode(mode);

        let minute = self.current_minute();
        self.event_log.log(Event::AutoArrivalsToggled {
            minute,
            enabled,
            rate_per_minute: rate,
        });
        tracing::info!(minute, enabled, rate, "auto arrivals toggled");
        Ok(())
    }

    /// Wipe everything back to the initial configuration at minute zero
    pub fn reset(&mut self) {
        self.state
            .reset(self.config.initial_mode, self.config.arrival_mode);
        self.dispatcher.set_mode(self.config.initial_mode);
        self.rng = RngManager::new(self.config.rng_seed);
        self.metrics = MetricsAggregator::new(self.config.rolling_window);
        self.event_log.clear();
        tracing::info!("simulation reset");
    }

    /// Execute one simulated minute
    ///
    /// # Errors
    ///
    /// Only `SimulationError::Invariant`, which indicates a scheduling bug.
    pub fn advance_one_minute(&mut self) -> Result<TickResult, SimulationError> {
        let minute = self.current_minute();
        let mut result = TickResult {
            minute,
            ..TickResult::default()
        };

        // STEP 1: ARRIVALS
        if let ArrivalMode::Poisson { rate_per_minute } = self.state.arrival_mode() {
            let count = self.generator.sample_count(rate_per_minute, &mut self.rng);
            for _ in 0..count {
                let order = self.add_random_order();
                result.arrivals.push(order.id());
            }
        }

        // STEP 2: SERVICE
        for order in self.state.pool_mut().tick(minute)? {
            if let (Some(barista_id), Some(total_minutes)) = (order.assigned_barista(), order.total_minutes()) {
                self.event_log.log(Event::OrderCompleted {
                    minute,
                    order_id: order.id(),
                    barista_id,
                    total_minutes,
                });
            }
            self.metrics.record_completed(&order);
            result.completions.push(order.id());
            self.state.push_completed(order);
        }

        // STEP 3: DISPATCH
        let outcome = self.dispatcher.assign(&mut self.state)?;
        self.metrics.record_dispatch(&outcome);
        for assignment in &outcome.assignments {
            self.event_log.log(Event::OrderAssigned {
                minute,
                order_id: assignment.order_id,
                barista_id: assignment.barista_id,
                priority_score: assignment.priority_score,
                waited_minutes: assignment.waited_minutes,
            });
        }
        for flag in &outcome.fairness_flags {
            self.event_log.log(Event::FairnessViolation {
                minute,
                order_id: flag.order_id,
                people_served_ahead: flag.people_served_ahead,
            });
            result.fairness_flags.push(flag.order_id);
        }
        result.assignments = outcome.assignments;

        // STEP 4: ABANDONMENT
        for mut order in self.state.take_expired(minute) {
            order
                .abandon(minute)
                .map_err(|e| SimulationError::Invariant(e.to_string()))?;
            let waited_minutes = order.minutes_waited(minute);
            tracing::warn!(
                minute,
                order_id = order.id(),
                customer = %order.customer(),
                waited = waited_minutes,
                "customer left the queue"
            );
            self.event_log.log(Event::OrderAbandoned {
                minute,
                order_id: order.id(),
                waited_minutes,
            });
            self.metrics.record_abandoned(&order);
            result.abandonments.push(order.id());
            self.state.push_abandoned(order);
        }

        // STEP 5: ADVANCE TIME
        self.state.advance_minute();
        result.queue_length = self.state.queue_len();

        tracing::debug!(
            minute,
            arrivals = result.arrivals.len(),
            assigned = result.assignments.len(),
            completed = result.completions.len(),
            abandoned = result.abandonments.len(),
            queue = result.queue_length,
            "tick"
        );
        Ok(result)
    }

    /// Run `minutes` ticks back to back
    pub fn run_minutes(&mut self, minutes: u32) -> Result<Vec<TickResult>, SimulationError> {
        (0..minutes).map(|_| self.advance_one_minute()).collect()
    }

    fn admit(&mut self, drink: DrinkType, customer: CustomerType) -> Order {
        let minute = self.current_minute();
        let id = self.state.enqueue(drink, customer);
        self.event_log.log(Event::OrderArrived {
            minute,
            order_id: id,
            drink,
            customer,
        });
        tracing::debug!(minute, order_id = id, %drink, %customer, "order created");
        Order::new(id, drink, customer, minute)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Queued orders in the order the active policy would serve them
    pub fn queue_snapshot(&self) -> Vec<QueuedOrderView> {
        let now = self.current_minute();
        let pending = self.state.pending();
        let workers = self.state.pool().len().max(1) as f64;
        let mut minutes_ahead = self.state.pool().backlog_minutes();

        self.dispatcher
            .rank(pending, now)
            .into_iter()
            .enumerate()
            .map(|(position, entry)| {
                let order = &pending[entry.index];
                let view = QueuedOrderView {
                    rank: position + 1,
                    order_id: order.id(),
                    drink: order.drink(),
                    customer: order.customer(),
                    arrival_minute: order.arrival_minute(),
                    waited_minutes: order.minutes_waited(now),
                    priority_score: entry.score.value,
                    urgency: entry.score.urgency,
                    estimated_wait_minutes: minutes_ahead as f64 / workers,
                    people_served_ahead: order.people_served_ahead(),
                    priority_reason: priority_reason(order, now, self.dispatcher.settings()),
                };
                minutes_ahead += order.prep_minutes();
                view
            })
            .collect()
    }

    /// Per-barista state with workload flags
    pub fn worker_snapshot(&self) -> Vec<WorkerBreakdown> {
        worker_breakdown(self.state.pool(), &self.config.workload)
    }

    /// Aggregate running metrics and the current policy
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot(&self.state)
    }

    /// Long-run and rolling-window statistics
    pub fn analytics(&self) -> AnalyticsReport {
        self.metrics.analytics(&self.state, &self.config.workload)
    }

    /// Verify the conservation invariant of the live state
    pub fn check_invariants(&self) -> Result<(), SimulationError> {
        self.state
            .check_conservation()
            .map_err(SimulationError::Invariant)
    }

    // ========================================================================
    // Checkpointing
    // ========================================================================

    /// Serialize the full clock state to JSON
    pub fn save_state(&self) -> Result<String, SimulationError> {
        let snapshot = StateSnapshot::capture(
            &self.state,
            &self.rng,
            &self.metrics,
            compute_config_hash(&self.config)?,
        );
        serde_json::to_string(&snapshot)
            .map_err(|e| SimulationError::SerializationError(format!("Snapshot serialization failed: {}", e)))
    }

    /// Restore a clock saved with `save_state` under the same config
    ///
    /// The event log starts empty; history before the checkpoint is not kept.
    pub fn load_state(config: EngineConfig, json: &str) -> Result<Self, SimulationError> {
        config.validate()?;

        let snapshot: StateSnapshot = serde_json::from_str(json)
            .map_err(|e| SimulationError::SerializationError(format!("Snapshot parse failed: {}", e)))?;

        let expected = compute_config_hash(&config)?;
        if snapshot.config_hash != expected {
            return Err(SimulationError::ConfigMismatch {
                expected,
                actual: snapshot.config_hash,
            });
        }
        validate_snapshot(&snapshot, config.worker_count)?;

        let (state, rng, metrics) = snapshot.restore();
        state
            .check_conservation()
            .map_err(SimulationError::StateValidationError)?;

        tracing::info!(minute = state.current_minute(), "state restored from checkpoint");
        Ok(Self {
            dispatcher: Dispatcher::new(state.mode(), config.policy),
            generator: ArrivalGenerator::new(&config.arrivals),
            event_log: EventLog::new(),
            state,
            rng,
            metrics,
            config,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
