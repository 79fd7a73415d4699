//! Arrival generation for walk-up orders.
//!
//! Orders arrive three ways:
//! - explicitly, one at a time (`CreateOrder` / `AddRandomOrder`)
//! - in a rush batch of 5-8 random orders
//! - automatically, with a Poisson-distributed count per minute
//!
//! Random orders draw their drink and customer tier from fixed frequency
//! tables. All draws go through `RngManager`, so the same seed and config
//! always produce the same arrivals.
//!
//! # Example
//!
//! ```
//! use barista_simulator_core_rs::arrivals::{generate_schedule, ArrivalConfig};
//! use barista_simulator_core_rs::rng::RngManager;
//!
//! let config = ArrivalConfig::default();
//! let mut rng = RngManager::new(42);
//! let schedule = generate_schedule(&config, 20, 1.4, 120, &mut rng).unwrap();
//!
//! assert_eq!(schedule.len(), 20);
//! assert!(schedule.windows(2).all(|w| w[0].minute <= w[1].minute));
//! ```

use crate::models::{CustomerType, DrinkType};
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Default Poisson rate (arrivals per minute)
pub const DEFAULT_ARRIVAL_RATE: f64 = 1.4;

/// Highest accepted Poisson rate (arrivals per minute)
pub const MAX_ARRIVAL_RATE: f64 = 100.0;

#[derive(Debug, Error, PartialEq)]
pub enum ArrivalError {
    #[error("Arrival rate must be positive and at most 100 per minute, got {0}")]
    InvalidRate(f64),

    #[error("Frequency table '{0}' has no positive weight")]
    EmptyFrequencyTable(&'static str),

    #[error("Frequency table '{table}' has invalid weight {weight}")]
    InvalidWeight { table: &'static str, weight: f64 },
}

/// How new orders enter the queue on each tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ArrivalMode {
    /// Only explicit commands create orders
    Manual,

    /// Every tick admits a Poisson(λ) number of random orders
    Poisson { rate_per_minute: f64 },
}

impl ArrivalMode {
    pub fn is_automatic(&self) -> bool {
        matches!(self, ArrivalMode::Poisson { .. })
    }
}

/// Frequency tables for randomly generated orders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrivalConfig {
    /// Relative weight of each drink; missing drinks are never drawn
    pub drink_weights: BTreeMap<DrinkType, f64>,

    /// Relative weight of each customer tier
    pub customer_weights: BTreeMap<CustomerType, f64>,
}

impl Default for ArrivalConfig {
    fn default() -> Self {
        Self {
            drink_weights: DrinkType::ALL
                .iter()
                .map(|d| (*d, d.arrival_weight()))
                .collect(),
            customer_weights: CustomerType::ALL
                .iter()
                .map(|c| (*c, c.arrival_weight()))
                .collect(),
        }
    }
}

impl ArrivalConfig {
    pub fn validate(&self) -> Result<(), ArrivalError> {
        validate_table("drink_weights", self.drink_weights.values())?;
        validate_table("customer_weights", self.customer_weights.values())
    }
}

fn validate_table<'a>(
    table: &'static str,
    weights: impl Iterator<Item = &'a f64>,
) -> Result<(), ArrivalError> {
    let mut any_positive = false;
    for weight in weights {
        if !weight.is_finite() || *weight < 0.0 {
            return Err(ArrivalError::InvalidWeight {
                table,
                weight: *weight,
            });
        }
        any_positive |= *weight > 0.0;
    }
    if any_positive {
        Ok(())
    } else {
        Err(ArrivalError::EmptyFrequencyTable(table))
    }
}

/// Validate a Poisson rate: positive and no more than `MAX_ARRIVAL_RATE`
pub fn validate_rate(rate: f64) -> Result<(), ArrivalError> {
    if rate > 0.0 && rate <= MAX_ARRIVAL_RATE {
        Ok(())
    } else {
        Err(ArrivalError::InvalidRate(rate))
    }
}

/// Samples random orders from the configured frequency tables
#[derive(Debug, Clone)]
pub struct ArrivalGenerator {
    drinks: Vec<DrinkType>,
    drink_weights: Vec<f64>,
    customers: Vec<CustomerType>,
    customer_weights: Vec<f64>,
}

impl ArrivalGenerator {
    /// Build a generator; the config must already be validated
    pub fn new(config: &ArrivalConfig) -> Self {
        let (drinks, drink_weights) = config.drink_weights.iter().map(|(d, w)| (*d, *w)).unzip();
        let (customers, customer_weights) = config
            .customer_weights
            .iter()
            .map(|(c, w)| (*c, *w))
            .unzip();

        Self {
            drinks,
            drink_weights,
            customers,
            customer_weights,
        }
    }

    pub fn sample_drink(&self, rng: &mut RngManager) -> DrinkType {
        rng.choose_weighted(&self.drink_weights)
            .map(|idx| self.drinks[idx])
            .unwrap_or(DrinkType::Espresso)
    }

    pub fn sample_customer(&self, rng: &mut RngManager) -> CustomerType {
        rng.choose_weighted(&self.customer_weights)
            .map(|idx| self.customers[idx])
            .unwrap_or(CustomerType::Regular)
    }

    /// Number of arrivals in one minute at `rate`
    pub fn sample_count(&self, rate: f64, rng: &mut RngManager) -> u32 {
        rng.poisson(rate)
    }

    /// Size of a rush batch, uniform over `min..=max`
    pub fn sample_rush_size(&self, (min, max): (u32, u32), rng: &mut RngManager) -> u32 {
        if min >= max {
            return min;
        }
        rng.range(min as i64, max as i64 + 1) as u32
    }
}

/// One pre-generated arrival, used to replay an identical stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledArrival {
    pub minute: u32,
    pub drink: DrinkType,
    pub customer: CustomerType,
}

/// Generate up to `count` arrivals with Poisson(`rate`) orders per minute
///
/// Minutes are non-decreasing; several arrivals may share a minute.
/// Sampling stops at `horizon_minutes`, so a slow rate yields a short
/// schedule rather than one that runs past the end of the run.
pub fn generate_schedule(
    config: &ArrivalConfig,
    count: usize,
    rate: f64,
    horizon_minutes: u32,
    rng: &mut RngManager,
) -> Result<Vec<ScheduledArrival>, ArrivalError> {
    validate_rate(rate)?;
    config.validate()?;

    let generator = ArrivalGenerator::new(config);
    let mut schedule = Vec::with_capacity(count);
    let mut minute = 0u32;

    while schedule.len() < count && minute < horizon_minutes {
        let arrivals = generator.sample_count(rate, rng) as usize;
        for _ in 0..arrivals.min(count - schedule.len()) {
            schedule.push(ScheduledArrival {
                minute,
                drink: generator.sample_drink(rng),
                customer: generator.sample_customer(rng),
            });
        }
        minute += 1;
    }

    Ok(schedule)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_deterministic() {
        let config = ArrivalConfig::default();
        let a = generate_schedule(&config, 50, 1.4, 300, &mut RngManager::new(7)).unwrap();
        let b = generate_schedule(&config, 50, 1.4, 300, &mut RngManager::new(7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_schedule_stops_at_horizon() {
        let config = ArrivalConfig::default();
        let schedule = generate_schedule(&config, 1_000, 1.4, 10, &mut RngManager::new(3)).unwrap();
        assert!(schedule.len() < 1_000);
        assert!(schedule.iter().all(|a| a.minute < 10));

        let sparse = generate_schedule(&config, 1, 1e-12, 500, &mut RngManager::new(3)).unwrap();
        assert!(sparse.is_empty());
    }

    #[test]
    fn test_schedule_rejects_zero_rate() {
        let config = ArrivalConfig::default();
        let err = generate_schedule(&config, 5, 0.0, 60, &mut RngManager::new(1)).unwrap_err();
        assert_eq!(err, ArrivalError::InvalidRate(0.0));
    }

    #[test]
    fn test_rate_bounds() {
        assert!(validate_rate(MAX_ARRIVAL_RATE).is_ok());
        assert!(validate_rate(0.001).is_ok());
        assert_eq!(validate_rate(800.0), Err(ArrivalError::InvalidRate(800.0)));
        assert!(validate_rate(f64::NAN).is_err());
        assert!(validate_rate(f64::INFINITY).is_err());
    }

    #[test]
    fn test_zero_weight_drink_never_drawn() {
        let mut config = ArrivalConfig::default();
        config.drink_weights.insert(DrinkType::Mocha, 0.0);
        let generator = ArrivalGenerator::new(&config);
        let mut rng = RngManager::new(11);

        for _ in 0..2_000 {
            assert_ne!(generator.sample_drink(&mut rng), DrinkType::Mocha);
        }
    }

    #[test]
    fn test_empty_table_rejected() {
        let config = ArrivalConfig {
            drink_weights: BTreeMap::new(),
            customer_weights: ArrivalConfig::default().customer_weights,
        };
        assert_eq!(
            config.validate(),
            Err(ArrivalError::EmptyFrequencyTable("drink_weights"))
        );
    }

    #[test]
    fn test_rush_size_in_bounds() {
        let generator = ArrivalGenerator::new(&ArrivalConfig::default());
        let mut rng = RngManager::new(5);
        for _ in 0..200 {
            let size = generator.sample_rush_size((5, 8), &mut rng);
            assert!((5..=8).contains(&size));
        }
    }
}
