//! Worker pool
//!
//! A fixed-size set of baristas. The dispatcher assigns into it and the
//! clock advances it one minute at a time. Barista ids are their index in
//! the pool, so "lowest id first" is simply front-to-back order.

use crate::models::barista::{Barista, BaristaError};
use crate::models::order::Order;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerPool {
    baristas: Vec<Barista>,
}

impl WorkerPool {
    /// Create a pool with one barista per name; ids follow name order
    ///
    /// # Example
    /// ```
    /// use barista_simulator_core_rs::pool::WorkerPool;
    ///
    /// let pool = WorkerPool::with_default_names(3);
    /// assert_eq!(pool.len(), 3);
    /// assert_eq!(pool.baristas()[2].name(), "Barista 3");
    /// ```
    pub fn new(names: Vec<String>) -> Self {
        let baristas = names
            .into_iter()
            .enumerate()
            .map(|(id, name)| Barista::new(id, name))
            .collect();
        Self { baristas }
    }

    pub fn with_default_names(count: usize) -> Self {
        Self::new(default_names(count))
    }

    pub(crate) fn from_baristas(baristas: Vec<Barista>) -> Self {
        Self { baristas }
    }

    pub fn len(&self) -> usize {
        self.baristas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.baristas.is_empty()
    }

    pub fn baristas(&self) -> &[Barista] {
        &self.baristas
    }

    pub fn get(&self, barista_id: usize) -> Option<&Barista> {
        self.baristas.get(barista_id)
    }

    /// Lowest-id free barista
    pub fn first_free(&self) -> Option<usize> {
        self.baristas.iter().position(Barista::is_free)
    }

    pub fn free_count(&self) -> usize {
        self.baristas.iter().filter(|b| b.is_free()).count()
    }

    pub fn busy_count(&self) -> usize {
        self.len() - self.free_count()
    }

    /// Orders currently being prepared, in barista order
    pub fn in_service(&self) -> impl Iterator<Item = &Order> {
        self.baristas.iter().filter_map(Barista::current_order)
    }

    /// Sum of remaining prep minutes across busy baristas
    pub fn backlog_minutes(&self) -> u32 {
        self.baristas.iter().map(Barista::remaining_minutes).sum()
    }

    pub fn total_work_minutes(&self) -> u32 {
        self.baristas.iter().map(Barista::total_work_minutes).sum()
    }

    /// Hand `order` to barista `barista_id`, starting service at `minute`
    ///
    /// Fails if the barista is busy or does not exist.
    pub fn assign(&mut self, barista_id: usize, order: Order, minute: u32) -> Result<(), BaristaError> {
        match self.baristas.get_mut(barista_id) {
            Some(barista) => barista.assign(order, minute),
            None => Err(BaristaError::UnknownBarista { barista_id }),
        }
    }

    /// Advance every busy barista by one minute
    ///
    /// Returns the orders completed at `minute`, in barista order. Stops at
    /// the first barista whose order cannot complete.
    pub fn tick(&mut self, minute: u32) -> Result<Vec<Order>, BaristaError> {
        let mut done = Vec::new();
        for barista in &mut self.baristas {
            if let Some(order) = barista.tick(minute)? {
                done.push(order);
            }
        }
        Ok(done)
    }

    /// Share of total work done by `barista_id` relative to an equal split
    ///
    /// 1.0 means exactly its fair share; before any work is done every
    /// barista reports 1.0.
    pub fn workload_ratio(&self, barista_id: usize) -> f64 {
        let total = self.total_work_minutes();
        match self.baristas.get(barista_id) {
            Some(barista) if total > 0 => {
                barista.total_work_minutes() as f64 * self.len() as f64 / total as f64
            }
            _ => 1.0,
        }
    }

    /// Drop all in-flight work and zero every counter
    pub(crate) fn reset(&mut self) {
        for barista in &mut self.baristas {
            barista.reset();
        }
    }
}

/// "Barista 1", "Barista 2", ...
pub fn default_names(count: usize) -> Vec<String> {
    (1..=count).map(|n| format!("Barista {}", n)).collect()
}
