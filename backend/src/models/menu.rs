//! Fixed drink menu and customer tiers
//!
//! Both tables are closed enums: the menu never changes at runtime, and
//! every order carries exactly one drink and one customer type.

use super::order::OrderError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Drinks on the menu
///
/// | Drink | Prep (min) | Arrival share |
/// |---|---|---|
/// | Cold Brew | 1 | 25% |
/// | Espresso | 2 | 20% |
/// | Americano | 2 | 15% |
/// | Cappuccino | 4 | 20% |
/// | Latte | 4 | 12% |
/// | Mocha | 6 | 8% |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DrinkType {
    ColdBrew,
    Espresso,
    Americano,
    Cappuccino,
    Latte,
    Mocha,
}

impl DrinkType {
    /// Every drink, in menu order
    pub const ALL: [DrinkType; 6] = [
        DrinkType::ColdBrew,
        DrinkType::Espresso,
        DrinkType::Americano,
        DrinkType::Cappuccino,
        DrinkType::Latte,
        DrinkType::Mocha,
    ];

    /// Fixed preparation time in minutes
    pub fn prep_minutes(self) -> u32 {
        match self {
            DrinkType::ColdBrew => 1,
            DrinkType::Espresso | DrinkType::Americano => 2,
            DrinkType::Cappuccino | DrinkType::Latte => 4,
            DrinkType::Mocha => 6,
        }
    }

    /// Relative arrival frequency (percent of walk-up orders)
    pub fn arrival_weight(self) -> f64 {
        match self {
            DrinkType::ColdBrew => 25.0,
            DrinkType::Espresso => 20.0,
            DrinkType::Americano => 15.0,
            DrinkType::Cappuccino => 20.0,
            DrinkType::Latte => 12.0,
            DrinkType::Mocha => 8.0,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            DrinkType::ColdBrew => "Cold Brew",
            DrinkType::Espresso => "Espresso",
            DrinkType::Americano => "Americano",
            DrinkType::Cappuccino => "Cappuccino",
            DrinkType::Latte => "Latte",
            DrinkType::Mocha => "Mocha",
        }
    }

    /// Shortest preparation time on the menu
    pub fn shortest_prep_minutes() -> u32 {
        Self::ALL
            .iter()
            .map(|d| d.prep_minutes())
            .min()
            .unwrap_or(1)
    }
}

impl fmt::Display for DrinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for DrinkType {
    type Err = OrderError;

    /// Parse a menu item, ignoring case, spaces, dashes and underscores
    ///
    /// # Example
    /// ```
    /// use barista_simulator_core_rs::models::DrinkType;
    ///
    /// assert_eq!("cold brew".parse::<DrinkType>().unwrap(), DrinkType::ColdBrew);
    /// assert_eq!("COLD_BREW".parse::<DrinkType>().unwrap(), DrinkType::ColdBrew);
    /// assert!("Frappuccino".parse::<DrinkType>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "coldbrew" => Ok(DrinkType::ColdBrew),
            "espresso" => Ok(DrinkType::Espresso),
            "americano" => Ok(DrinkType::Americano),
            "cappuccino" => Ok(DrinkType::Cappuccino),
            "latte" => Ok(DrinkType::Latte),
            "mocha" | "specialtymocha" => Ok(DrinkType::Mocha),
            _ => Err(OrderError::InvalidDrinkType(s.to_string())),
        }
    }
}

/// Customer loyalty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CustomerType {
    Gold,
    Regular,
    New,
}

impl CustomerType {
    pub const ALL: [CustomerType; 3] = [CustomerType::Gold, CustomerType::Regular, CustomerType::New];

    /// Minutes a customer of this tier will wait in the queue before leaving
    pub fn timeout_minutes(self) -> u32 {
        match self {
            CustomerType::Gold | CustomerType::Regular => 10,
            CustomerType::New => 8,
        }
    }

    /// Relative frequency among walk-up customers
    pub fn arrival_weight(self) -> f64 {
        match self {
            CustomerType::Gold => 20.0,
            CustomerType::Regular => 50.0,
            CustomerType::New => 30.0,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            CustomerType::Gold => "Gold Member",
            CustomerType::Regular => "Regular",
            CustomerType::New => "New Customer",
        }
    }
}

impl fmt::Display for CustomerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
