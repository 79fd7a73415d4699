//! Running and windowed statistics
//!
//! `MetricsAggregator` is fed every terminal order as the clock emits it and
//! every dispatch outcome, so each query is O(workers) rather than a rescan
//! of the logs. The rolling window keeps the last N completed orders.
//!
//! Rates are percentages:
//! - complaint rate: complaints / (completed + abandoned)
//! - fairness violation rate: skips past the tolerance / orders created

use crate::arrivals::ArrivalMode;
use crate::dispatch::DispatchOutcome;
use crate::models::{CustomerType, Order, SimulationState};
use crate::policy::QueueMode;
use crate::pool::WorkerPool;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Default size of the rolling window
pub const DEFAULT_ROLLING_WINDOW: usize = 100;

/// Workload ratio bounds outside which a barista is flagged
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkloadThresholds {
    pub overload_ratio: f64,
    pub underutilized_ratio: f64,
}

impl Default for WorkloadThresholds {
    fn default() -> Self {
        Self {
            overload_ratio: 1.2,
            underutilized_ratio: 0.8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct CompletedSample {
    wait_minutes: u32,
    total_minutes: u32,
    complaint: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsAggregator {
    window_size: usize,
    window: VecDeque<CompletedSample>,

    completed: u64,
    abandoned: u64,
    complaints: u64,
    total_wait_minutes: u64,
    total_completion_minutes: u64,
    max_wait_minutes: u32,

    fairness_violations: u64,
    skip_events: u64,
    justified_skips: u64,

    complaints_by_customer: BTreeMap<CustomerType, u64>,
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_ROLLING_WINDOW)
    }
}

impl MetricsAggregator {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size,
            window: VecDeque::with_capacity(window_size),
            completed: 0,
            abandoned: 0,
            complaints: 0,
            total_wait_minutes: 0,
            total_completion_minutes: 0,
            max_wait_minutes: 0,
            fairness_violations: 0,
            skip_events: 0,
            justified_skips: 0,
            complaints_by_customer: BTreeMap::new(),
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Record an order that has just reached Completed
    ///
    /// Orders in any other status are ignored.
    pub fn record_completed(&mut self, order: &Order) {
        let (Some(wait), Some(total)) = (order.wait_minutes(), order.total_minutes()) else {
            return;
        };

        self.completed += 1;
        self.total_wait_minutes += wait as u64;
        self.total_completion_minutes += total as u64;
        self.max_wait_minutes = self.max_wait_minutes.max(wait);

        let complaint = order.is_complaint();
        if complaint {
            self.record_complaint(order.customer());
        }

        if self.window.len() == self.window_size {
            self.window.pop_front();
        }
        if self.window_size > 0 {
            self.window.push_back(CompletedSample {
                wait_minutes: wait,
                total_minutes: total,
                complaint,
            });
        }
    }

    /// Record an order that has just been abandoned (always a complaint)
    pub fn record_abandoned(&mut self, order: &Order) {
        self.abandoned += 1;
        self.record_complaint(order.customer());
    }

    /// Fold in skip accounting and fairness violations from one dispatch pass
    pub fn record_dispatch(&mut self, outcome: &DispatchOutcome) {
        self.skip_events += outcome.skip_events as u64;
        self.justified_skips += outcome.justified_skips as u64;
        self.fairness_violations += outcome.fairness_violations as u64;
    }

    fn record_complaint(&mut self, customer: CustomerType) {
        self.complaints += 1;
        *self.complaints_by_customer.entry(customer).or_insert(0) += 1;
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn abandoned(&self) -> u64 {
        self.abandoned
    }

    pub fn complaints(&self) -> u64 {
        self.complaints
    }

    pub fn fairness_violations(&self) -> u64 {
        self.fairness_violations
    }

    pub fn skip_events(&self) -> u64 {
        self.skip_events
    }

    pub fn average_wait_minutes(&self) -> f64 {
        ratio(self.total_wait_minutes as f64, self.completed)
    }

    pub fn max_wait_minutes(&self) -> u32 {
        self.max_wait_minutes
    }

    pub fn average_completion_minutes(&self) -> f64 {
        ratio(self.total_completion_minutes as f64, self.completed)
    }

    pub fn complaint_rate(&self) -> f64 {
        ratio(self.complaints as f64 * 100.0, self.completed + self.abandoned)
    }

    pub fn fairness_violation_rate(&self, total_created: u64) -> f64 {
        ratio(self.fairness_violations as f64 * 100.0, total_created)
    }

    /// Share of skip events where the order served ahead was a shorter job
    pub fn justified_skip_share(&self) -> f64 {
        ratio(self.justified_skips as f64, self.skip_events)
    }

    /// Complaints per customer tier; every tier is present
    pub fn complaints_by_customer(&self) -> BTreeMap<CustomerType, u64> {
        CustomerType::ALL
            .iter()
            .map(|c| (*c, self.complaints_by_customer.get(c).copied().unwrap_or(0)))
            .collect()
    }

    pub fn rolling(&self) -> RollingWindowStats {
        let samples = self.window.len() as u64;
        let wait: u64 = self.window.iter().map(|s| s.wait_minutes as u64).sum();
        let total: u64 = self.window.iter().map(|s| s.total_minutes as u64).sum();
        let complaints = self.window.iter().filter(|s| s.complaint).count() as u64;

        RollingWindowStats {
            window_size: self.window_size,
            samples: samples as usize,
            average_wait_minutes: ratio(wait as f64, samples),
            average_completion_minutes: ratio(total as f64, samples),
            complaints,
            complaint_rate: ratio(complaints as f64 * 100.0, samples),
        }
    }

    /// Aggregate running metrics combined with the live queue and pool
    pub fn snapshot(&self, state: &SimulationState) -> MetricsSnapshot {
        let total_created = state.total_created();
        let (auto_arrivals, arrival_rate) = match state.arrival_mode() {
            ArrivalMode::Manual => (false, None),
            ArrivalMode::Poisson { rate_per_minute } => (true, Some(rate_per_minute)),
        };

        MetricsSnapshot {
            current_minute: state.current_minute(),
            mode: state.mode(),
            auto_arrivals,
            arrival_rate,
            queue_length: state.queue_len(),
            in_service: state.pool().busy_count(),
            total_created,
            completed: self.completed,
            abandoned: self.abandoned,
            complaints: self.complaints,
            complaint_rate: self.complaint_rate(),
            average_wait_minutes: self.average_wait_minutes(),
            max_wait_minutes: self.max_wait_minutes,
            average_completion_minutes: self.average_completion_minutes(),
            fairness_violations: self.fairness_violations,
            fairness_violation_rate: self.fairness_violation_rate(total_created),
            skip_events: self.skip_events,
            justified_skip_share: self.justified_skip_share(),
        }
    }

    /// Long-run and rolling-window statistics with per-barista breakdown
    pub fn analytics(&self, state: &SimulationState, thresholds: &WorkloadThresholds) -> AnalyticsReport {
        let workers = worker_breakdown(state.pool(), thresholds);
        AnalyticsReport {
            average_completion_minutes: self.average_completion_minutes(),
            average_wait_minutes: self.average_wait_minutes(),
            total_complaints: self.complaints,
            complaint_rate: self.complaint_rate(),
            total_processed: self.completed + self.abandoned,
            current_queue_size: state.queue_len(),
            complaints_by_customer: self.complaints_by_customer(),
            workload_balance: workload_balance(state.pool()),
            rolling: self.rolling(),
            workers,
        }
    }
}

fn ratio(numerator: f64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as f64
    }
}

/// Aggregate running metrics plus the current policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub current_minute: u32,
    pub mode: QueueMode,
    pub auto_arrivals: bool,
    pub arrival_rate: Option<f64>,

    pub queue_length: usize,
    pub in_service: usize,
    pub total_created: u64,
    pub completed: u64,
    pub abandoned: u64,

    pub complaints: u64,
    /// Percent of resolved orders (completed + abandoned)
    pub complaint_rate: f64,

    /// Over completed orders
    pub average_wait_minutes: f64,
    pub max_wait_minutes: u32,
    pub average_completion_minutes: f64,

    pub fairness_violations: u64,
    /// Percent of created orders
    pub fairness_violation_rate: f64,
    pub skip_events: u64,
    /// Fraction in [0, 1]
    pub justified_skip_share: f64,
}

/// Statistics over the last N completed orders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingWindowStats {
    pub window_size: usize,
    pub samples: usize,
    pub average_wait_minutes: f64,
    pub average_completion_minutes: f64,
    pub complaints: u64,
    pub complaint_rate: f64,
}

/// Per-barista workload view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerBreakdown {
    pub barista_id: usize,
    pub name: String,
    pub busy: bool,
    pub current_order_id: Option<u64>,
    pub remaining_minutes: u32,
    pub total_work_minutes: u32,
    pub orders_completed: u32,
    pub average_minutes_per_order: f64,
    pub workload_ratio: f64,
    pub overloaded: bool,
    pub underutilized: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub average_completion_minutes: f64,
    pub average_wait_minutes: f64,
    pub total_complaints: u64,
    pub complaint_rate: f64,
    pub total_processed: u64,
    pub current_queue_size: usize,
    pub complaints_by_customer: BTreeMap<CustomerType, u64>,

    /// 100 minus the coefficient of variation of work minutes (x100), floored at 0
    pub workload_balance: f64,
    pub rolling: RollingWindowStats,
    pub workers: Vec<WorkerBreakdown>,
}

/// Breakdown for every barista in id order
pub fn worker_breakdown(pool: &WorkerPool, thresholds: &WorkloadThresholds) -> Vec<WorkerBreakdown> {
    pool.baristas()
        .iter()
        .map(|barista| {
            let workload_ratio = pool.workload_ratio(barista.id());
            WorkerBreakdown {
                barista_id: barista.id(),
                name: barista.name().to_string(),
                busy: !barista.is_free(),
                current_order_id: barista.current_order_id(),
                remaining_minutes: barista.remaining_minutes(),
                total_work_minutes: barista.total_work_minutes(),
                orders_completed: barista.orders_completed(),
                average_minutes_per_order: barista.average_minutes_per_order(),
                workload_ratio,
                overloaded: workload_ratio > thresholds.overload_ratio,
                underutilized: workload_ratio < thresholds.underutilized_ratio,
            }
        })
        .collect()
}

/// Balance score in [0, 100]; 100 when work is split evenly or not started
pub fn workload_balance(pool: &WorkerPool) -> f64 {
    let n = pool.len();
    if n == 0 {
        return 100.0;
    }
    let mean = pool.total_work_minutes() as f64 / n as f64;
    if mean == 0.0 {
        return 100.0;
    }

    let variance = pool
        .baristas()
        .iter()
        .map(|b| {
            let diff = b.total_work_minutes() as f64 - mean;
            diff * diff
        })
        .sum::<f64>()
        / n as f64;

    (100.0 - variance.sqrt() / mean * 100.0).max(0.0)
}
