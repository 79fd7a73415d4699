//! Checkpoint - Save/Load Simulation State
//!
//! Enables serialization and deserialization of complete clock state
//! for pause/resume functionality.
//!
//! # Critical Invariants
//!
//! - **Determinism**: restoring and continuing gives the same results as never
//!   having paused (RNG state is part of the snapshot)
//! - **Conservation**: every created order is in exactly one place
//! - **Worker Integrity**: a busy barista holds an in-service order it owns
//! - **Config Matching**: state can only be loaded with matching config

use crate::arrivals::ArrivalMode;
use crate::metrics::MetricsAggregator;
use crate::models::barista::Barista;
use crate::models::order::{Order, OrderId, OrderStatus};
use crate::models::state::SimulationState;
use crate::orchestrator::SimulationError;
use crate::policy::QueueMode;
use crate::pool::WorkerPool;
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

// ============================================================================
// Snapshot Structures
// ============================================================================

/// Complete clock state snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Minute the clock will process next
    pub current_minute: u32,

    /// RNG state at time of snapshot (CRITICAL for determinism)
    pub rng_state: u64,

    pub mode: QueueMode,
    pub arrival_mode: ArrivalMode,
    pub next_order_id: OrderId,

    pub pending: Vec<Order>,

    /// Baristas in id order, each with any in-flight order
    pub baristas: Vec<Barista>,

    pub completed: Vec<Order>,
    pub abandoned: Vec<Order>,

    /// Running and windowed statistics
    pub metrics: MetricsAggregator,

    /// SHA256 hash of original config (for validation)
    pub config_hash: String,
}

impl StateSnapshot {
    pub(crate) fn capture(
        state: &SimulationState,
        rng: &RngManager,
        metrics: &MetricsAggregator,
        config_hash: String,
    ) -> Self {
        Self {
            current_minute: state.current_minute(),
            rng_state: rng.get_state(),
            mode: state.mode(),
            arrival_mode: state.arrival_mode(),
            next_order_id: state.next_order_id(),
            pending: state.pending().to_vec(),
            baristas: state.pool().baristas().to_vec(),
            completed: state.completed().to_vec(),
            abandoned: state.abandoned().to_vec(),
            metrics: metrics.clone(),
            config_hash,
        }
    }

    pub(crate) fn restore(self) -> (SimulationState, RngManager, MetricsAggregator) {
        let state = SimulationState::from_parts(
            self.current_minute,
            self.pending,
            WorkerPool::from_baristas(self.baristas),
            self.completed,
            self.abandoned,
            self.mode,
            self.arrival_mode,
            self.next_order_id,
        );
        (state, RngManager::new(self.rng_state), self.metrics)
    }
}

// ============================================================================
// Config Hashing
// ============================================================================

/// Compute deterministic SHA256 hash of config
///
/// Uses canonical JSON serialization with sorted keys so the hash does not
/// depend on field or map iteration order.
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, SimulationError> {
    sha256_canonical_json(config)
}

/// SHA256 of the canonical (key-sorted) JSON form of `value`
pub fn sha256_canonical_json<T: Serialize>(value: &T) -> Result<String, SimulationError> {
    use serde_json::Value;

    let value = serde_json::to_value(value)
        .map_err(|e| SimulationError::SerializationError(format!("Serialization failed: {}", e)))?;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let json = serde_json::to_string(&canonicalize(value))
        .map_err(|e| SimulationError::SerializationError(format!("Serialization failed: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validate state snapshot integrity
///
/// Checks critical invariants:
/// - Worker count matches the config
/// - Barista ids match their position; busy baristas own an in-service order
/// - Every issued id appears exactly once across queue, baristas and logs
/// - Order timings run forward and none lies past the snapshot minute
pub fn validate_snapshot(snapshot: &StateSnapshot, expected_workers: usize) -> Result<(), SimulationError> {
    // 1. Worker count
    if snapshot.baristas.len() != expected_workers {
        return Err(SimulationError::StateValidationError(format!(
            "Snapshot has {} baristas, config expects {}",
            snapshot.baristas.len(),
            expected_workers
        )));
    }

    // 2. Worker integrity
    for (index, barista) in snapshot.baristas.iter().enumerate() {
        if barista.id() != index {
            return Err(SimulationError::StateValidationError(format!(
                "Barista at position {} has id {}",
                index,
                barista.id()
            )));
        }

        match barista.current_order() {
            Some(order) => {
                let owned = matches!(
                    order.status(),
                    OrderStatus::InService { barista_id, .. } if barista_id == index
                );
                let remaining = barista.remaining_minutes();
                if !owned || remaining == 0 || remaining > order.prep_minutes() {
                    return Err(SimulationError::StateValidationError(format!(
                        "Barista {} holds order {} in an inconsistent state",
                        index,
                        order.id()
                    )));
                }
            }
            None if barista.remaining_minutes() != 0 => {
                return Err(SimulationError::StateValidationError(format!(
                    "Free barista {} has {} minutes remaining",
                    index,
                    barista.remaining_minutes()
                )));
            }
            None => {}
        }
    }

    // 3. Order uniqueness
    let mut seen: BTreeMap<OrderId, &'static str> = BTreeMap::new();
    let located = snapshot
        .pending
        .iter()
        .map(|o| (o.id(), "pending queue"))
        .chain(
            snapshot
                .baristas
                .iter()
                .filter_map(Barista::current_order)
                .map(|o| (o.id(), "barista")),
        )
        .chain(snapshot.completed.iter().map(|o| (o.id(), "completed log")))
        .chain(snapshot.abandoned.iter().map(|o| (o.id(), "abandoned log")));

    for (id, location) in located {
        if let Some(previous) = seen.insert(id, location) {
            return Err(SimulationError::StateValidationError(format!(
                "Duplicate order {} in {} and {}",
                id, previous, location
            )));
        }
    }

    // 4. Timeline
    let now = snapshot.current_minute;
    let timed = snapshot
        .pending
        .iter()
        .chain(snapshot.baristas.iter().filter_map(Barista::current_order))
        .chain(&snapshot.completed)
        .chain(&snapshot.abandoned);

    for order in timed {
        if !timeline_is_ordered(order, now) {
            return Err(SimulationError::StateValidationError(format!(
                "Order {} ({}, arrived {}) has timings inconsistent with minute {}",
                order.id(),
                order.status().label(),
                order.arrival_minute(),
                now
            )));
        }
    }

    Ok(())
}

/// `arrival <= started <= completed <= now`, for whichever minutes the
/// status carries
fn timeline_is_ordered(order: &Order, now: u32) -> bool {
    let arrival = order.arrival_minute();
    match order.status() {
        OrderStatus::Queued => arrival <= now,
        OrderStatus::InService { started_minute, .. } => arrival <= started_minute && started_minute <= now,
        OrderStatus::Completed {
            started_minute,
            completed_minute,
            ..
        } => arrival <= started_minute && started_minute <= completed_minute && completed_minute <= now,
        OrderStatus::Abandoned { minute } => arrival <= minute && minute <= now,
    }
}
