//! SMART vs FIFO comparison
//!
//! One seeded arrival schedule is generated up front and replayed through
//! two private clocks, one per policy. The clocks share nothing mutable, so
//! they run concurrently via `rayon::join`; the live simulation is never
//! touched.
//!
//! Identical request + seed ⇒ identical report, checkable through
//! `ComparisonReport::digest`.
//!
//! # Example
//!
//! ```
//! use barista_simulator_core_rs::comparison::{run_comparison, ComparisonRequest};
//!
//! let request = ComparisonRequest {
//!     arrival_count: 40,
//!     duration_minutes: 60,
//!     seed: Some(7),
//!     ..ComparisonRequest::default()
//! };
//! let a = run_comparison(&request).unwrap();
//! let b = run_comparison(&request).unwrap();
//! assert_eq!(a.digest().unwrap(), b.digest().unwrap());
//! assert_eq!(a.smart.orders.len(), 40);
//! ```

use crate::arrivals::{generate_schedule, ScheduledArrival, DEFAULT_ARRIVAL_RATE};
use crate::metrics::{workload_balance, MetricsSnapshot};
use crate::models::menu::{CustomerType, DrinkType};
use crate::models::order::{Order, OrderId, OrderStatus};
use crate::orchestrator::checkpoint::sha256_canonical_json;
use crate::orchestrator::{EngineConfig, SimulationClock, SimulationError};
use crate::policy::QueueMode;
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Parameters of one comparison run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRequest {
    /// Orders in the synthetic schedule
    pub arrival_count: usize,

    /// Minutes each clock is advanced
    pub duration_minutes: u32,

    /// Poisson arrivals per minute
    pub arrival_rate: f64,

    pub worker_count: usize,

    /// `None` draws a fresh seed, recorded in the report
    pub seed: Option<u64>,
}

impl Default for ComparisonRequest {
    fn default() -> Self {
        Self {
            arrival_count: 100,
            duration_minutes: 300,
            arrival_rate: DEFAULT_ARRIVAL_RATE,
            worker_count: 3,
            seed: None,
        }
    }
}

/// Where an order ended up when the run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderOutcome {
    Served,
    Abandoned,
    InService,
    Waiting,
}

/// Per-order audit line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetail {
    pub order_id: OrderId,
    pub drink: DrinkType,
    pub customer: CustomerType,
    pub arrival_minute: u32,
    pub prep_minutes: u32,
    pub wait_minutes: Option<u32>,
    pub total_minutes: Option<u32>,
    pub barista_id: Option<usize>,
    pub people_served_ahead: u32,
    pub complaint: bool,
    pub outcome: OrderOutcome,
}

impl OrderDetail {
    fn from_order(order: &Order) -> Self {
        let outcome = match order.status() {
            OrderStatus::Completed { .. } => OrderOutcome::Served,
            OrderStatus::Abandoned { .. } => OrderOutcome::Abandoned,
            OrderStatus::InService { .. } => OrderOutcome::InService,
            OrderStatus::Queued => OrderOutcome::Waiting,
        };
        Self {
            order_id: order.id(),
            drink: order.drink(),
            customer: order.customer(),
            arrival_minute: order.arrival_minute(),
            prep_minutes: order.prep_minutes(),
            wait_minutes: order.wait_minutes(),
            total_minutes: order.total_minutes(),
            barista_id: order.assigned_barista(),
            people_served_ahead: order.people_served_ahead(),
            complaint: order.is_complaint(),
            outcome,
        }
    }
}

/// One barista's part of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerShare {
    pub barista_id: usize,
    pub name: String,
    pub orders_completed: u32,
    pub total_work_minutes: u32,
    /// Percent of all work minutes in the run
    pub workload_share: f64,
}

/// Outcome of one policy over the shared schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyReport {
    pub mode: QueueMode,
    pub metrics: MetricsSnapshot,
    pub complaints_by_customer: BTreeMap<CustomerType, u64>,
    pub workload_balance: f64,
    pub workers: Vec<WorkerShare>,
    pub orders: Vec<OrderDetail>,
}

impl PolicyReport {
    fn from_clock(clock: &SimulationClock, scheduled: usize) -> Self {
        let state = clock.state();
        let pool = state.pool();
        let total_work = pool.total_work_minutes();

        let workers = pool
            .baristas()
            .iter()
            .map(|b| WorkerShare {
                barista_id: b.id(),
                name: b.name().to_string(),
                orders_completed: b.orders_completed(),
                total_work_minutes: b.total_work_minutes(),
                workload_share: if total_work == 0 {
                    0.0
                } else {
                    b.total_work_minutes() as f64 * 100.0 / total_work as f64
                },
            })
            .collect();

        // Schedule entry i was created as order i + 1
        let orders = (1..=scheduled as OrderId)
            .filter_map(|id| state.find_order(id))
            .map(OrderDetail::from_order)
            .collect();

        Self {
            mode: clock.mode(),
            metrics: clock.metrics(),
            complaints_by_customer: clock.aggregator().complaints_by_customer(),
            workload_balance: workload_balance(pool),
            workers,
            orders,
        }
    }
}

/// Relative gain of SMART over FIFO, in percent (positive = SMART better)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Improvement {
    pub wait_time_percent: f64,
    pub complaint_rate_percent: f64,
    pub completion_time_percent: f64,
}

impl Improvement {
    pub fn between(smart: &MetricsSnapshot, fifo: &MetricsSnapshot) -> Self {
        Self {
            wait_time_percent: reduction(smart.average_wait_minutes, fifo.average_wait_minutes),
            complaint_rate_percent: reduction(smart.complaint_rate, fifo.complaint_rate),
            completion_time_percent: reduction(
                smart.average_completion_minutes,
                fifo.average_completion_minutes,
            ),
        }
    }
}

fn reduction(smart: f64, fifo: f64) -> f64 {
    if fifo > 0.0 {
        (1.0 - smart / fifo) * 100.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub request: ComparisonRequest,

    /// Seed actually used (drawn fresh when the request had none)
    pub seed: u64,

    pub smart: PolicyReport,
    pub fifo: PolicyReport,
    pub improvement: Improvement,
}

impl ComparisonReport {
    /// SHA256 of the report's canonical JSON
    pub fn digest(&self) -> Result<String, SimulationError> {
        sha256_canonical_json(self)
    }
}

/// Runs SMART and FIFO side by side over one generated schedule
#[derive(Debug, Clone)]
pub struct ComparisonHarness {
    base: EngineConfig,
}

impl Default for ComparisonHarness {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl ComparisonHarness {
    /// `base` supplies policy settings, frequency tables and thresholds;
    /// worker count, seed, mode and arrival mode come from each request
    pub fn new(base: EngineConfig) -> Self {
        Self { base }
    }

    pub fn run(&self, request: &ComparisonRequest) -> Result<ComparisonReport, SimulationError> {
        if request.duration_minutes == 0 {
            return Err(SimulationError::InvalidConfig(
                "duration_minutes must be at least 1".to_string(),
            ));
        }

        let seed = request.seed.unwrap_or_else(fresh_seed);
        let mut rng = RngManager::new(seed);
        let schedule = generate_schedule(
            &self.base.arrivals,
            request.arrival_count,
            request.arrival_rate,
            request.duration_minutes,
            &mut rng,
        )?;

        let config = EngineConfig {
            worker_count: request.worker_count,
            barista_names: self
                .base
                .barista_names
                .clone()
                .filter(|names| names.len() == request.worker_count),
            rng_seed: seed,
            arrival_mode: crate::arrivals::ArrivalMode::Manual,
            ..self.base.clone()
        };
        config.validate()?;

        let (smart, fifo) = rayon::join(
            || replay(&config, QueueMode::Smart, &schedule, request.duration_minutes),
            || replay(&config, QueueMode::Fifo, &schedule, request.duration_minutes),
        );
        let (smart, fifo) = (smart?, fifo?);
        let improvement = Improvement::between(&smart.metrics, &fifo.metrics);

        tracing::info!(
            seed,
            orders = schedule.len(),
            smart_wait = smart.metrics.average_wait_minutes,
            fifo_wait = fifo.metrics.average_wait_minutes,
            wait_improvement = improvement.wait_time_percent,
            "comparison complete"
        );

        Ok(ComparisonReport {
            request: request.clone(),
            seed,
            smart,
            fifo,
            improvement,
        })
    }
}

/// Run a comparison with default engine settings
pub fn run_comparison(request: &ComparisonRequest) -> Result<ComparisonReport, SimulationError> {
    ComparisonHarness::default().run(request)
}

fn fresh_seed() -> u64 {
    Uuid::new_v4().as_u128() as u64
}

/// Drive one private clock through `schedule` for `duration` minutes
fn replay(
    config: &EngineConfig,
    mode: QueueMode,
    schedule: &[ScheduledArrival],
    duration: u32,
) -> Result<PolicyReport, SimulationError> {
    let mut clock = SimulationClock::new(EngineConfig {
        initial_mode: mode,
        ..config.clone()
    })?;

    let mut upcoming = schedule.iter().peekable();
    for minute in 0..duration {
        while let Some(arrival) = upcoming.next_if(|a| a.minute == minute) {
            clock.create_order(arrival.drink, Some(arrival.customer));
        }
        clock.advance_one_minute()?;
    }

    Ok(PolicyReport::from_clock(&clock, schedule.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(seed: u64) -> ComparisonRequest {
        ComparisonRequest {
            arrival_count: 60,
            duration_minutes: 120,
            seed: Some(seed),
            ..ComparisonRequest::default()
        }
    }

    #[test]
    fn test_same_seed_same_report() {
        let a = run_comparison(&request(11)).unwrap();
        let b = run_comparison(&request(11)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.digest().unwrap(), b.digest().unwrap());
    }

    #[test]
    fn test_both_runs_see_same_arrivals() {
        let report = run_comparison(&request(3)).unwrap();
        for (s, f) in report.smart.orders.iter().zip(&report.fifo.orders) {
            assert_eq!(
                (s.order_id, s.drink, s.customer, s.arrival_minute),
                (f.order_id, f.drink, f.customer, f.arrival_minute)
            );
        }
    }

    #[test]
    fn test_short_run_truncates_schedule() {
        let report = run_comparison(&ComparisonRequest {
            arrival_count: 50,
            duration_minutes: 5,
            seed: Some(9),
            ..ComparisonRequest::default()
        })
        .unwrap();

        // 1.4 per minute cannot fill 50 arrivals in 5 minutes
        assert!(report.fifo.orders.len() < 50);
        assert_eq!(report.fifo.orders.len(), report.smart.orders.len());
        assert_eq!(report.fifo.metrics.total_created, report.fifo.orders.len() as u64);
        assert!(report.fifo.orders.iter().all(|o| o.arrival_minute < 5));
    }

    #[test]
    fn test_unseeded_run_records_seed() {
        let report = run_comparison(&ComparisonRequest {
            arrival_count: 10,
            duration_minutes: 20,
            ..ComparisonRequest::default()
        })
        .unwrap();

        let replay = run_comparison(&ComparisonRequest {
            seed: Some(report.seed),
            ..report.request.clone()
        })
        .unwrap();
        assert_eq!(replay.smart, report.smart);
        assert_eq!(replay.fifo, report.fifo);
    }

    #[test]
    fn test_zero_duration_rejected() {
        let err = run_comparison(&ComparisonRequest {
            duration_minutes: 0,
            ..request(1)
        })
        .unwrap_err();
        assert!(matches!(err, SimulationError::InvalidConfig(_)));
    }

    #[test]
    fn test_reduction() {
        assert_eq!(reduction(2.0, 4.0), 50.0);
        assert_eq!(reduction(1.0, 0.0), 0.0);
    }
}
