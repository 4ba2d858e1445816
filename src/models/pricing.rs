use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodOption {
    WithFood,
    WithoutFood,
}

impl FoodOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            FoodOption::WithFood => "with_food",
            FoodOption::WithoutFood => "without_food",
        }
    }
}

impl fmt::Display for FoodOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FoodOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "with_food" => Ok(FoodOption::WithFood),
            "without_food" => Ok(FoodOption::WithoutFood),
            other => Err(format!("unknown food option '{other}'")),
        }
    }
}

/// How the buyer paid. `Cash` is the primary method; `Zelle` is the secondary method and may
/// carry a per-ticket surcharge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Zelle,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Zelle => "zelle",
        }
    }

    pub fn is_secondary(&self) -> bool {
        matches!(self, PaymentMethod::Zelle)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "zelle" => Ok(PaymentMethod::Zelle),
            other => Err(format!("unknown payment method '{other}'")),
        }
    }
}

/// A price range over ticket quantity, scoped to one event and one food option.
/// Both quantity bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingTier {
    pub id: Uuid,
    pub event_id: Uuid,
    pub quantity_from: i32,
    pub quantity_to: i32,
    pub price_per_ticket: Decimal,
    pub food_option: FoodOption,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PricingTier {
    pub fn covers(&self, quantity: i32) -> bool {
        self.quantity_from <= quantity && quantity <= self.quantity_to
    }

    pub fn overlaps(&self, quantity_from: i32, quantity_to: i32) -> bool {
        quantity_from <= self.quantity_to && quantity_to >= self.quantity_from
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPricingTier {
    pub event_id: Uuid,
    pub quantity_from: i32,
    pub quantity_to: i32,
    pub price_per_ticket: Decimal,
    pub food_option: FoodOption,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricingTierUpdate {
    pub quantity_from: Option<i32>,
    pub quantity_to: Option<i32>,
    pub price_per_ticket: Option<Decimal>,
    pub food_option: Option<FoodOption>,
    pub is_active: Option<bool>,
}

impl PricingTierUpdate {
    /// The tier as it would look once this update is applied.
    pub fn apply_to(&self, tier: &PricingTier) -> PricingTier {
        PricingTier {
            quantity_from: self.quantity_from.unwrap_or(tier.quantity_from),
            quantity_to: self.quantity_to.unwrap_or(tier.quantity_to),
            price_per_ticket: self.price_per_ticket.unwrap_or(tier.price_per_ticket),
            food_option: self.food_option.unwrap_or(tier.food_option),
            is_active: self.is_active.unwrap_or(tier.is_active),
            ..tier.clone()
        }
    }
}

fn default_active() -> bool {
    true
}
