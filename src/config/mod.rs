use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::FoodOption;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_BUCKET: &str = "qr-codes";
const DEFAULT_STORAGE_TIMEOUT_SECS: u64 = 10;
const DEFAULT_NOTIFY_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TIER_MAX_QUANTITY: i32 = 251;
const DEFAULT_PRICE_WITH_FOOD: i64 = 18;
const DEFAULT_PRICE_WITHOUT_FOOD: i64 = 15;
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid value '{value}' for {key}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: SocketAddr,
    pub http: HttpConfig,
    pub storage: StorageConfig,
    pub notifications: NotificationConfig,
    pub pricing: PricingConfig,
    pub registration: RegistrationConfig,
    pub reporting: ReportingConfig,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub allowed_origins: Vec<String>,
    /// Only send HSTS when served over HTTPS in production.
    pub include_hsts: bool,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub base_url: String,
    pub service_key: String,
    pub bucket: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    /// When unset, notifications are only logged.
    pub webhook_url: Option<String>,
    pub timeout: Duration,
}

/// One tier of the set an event can be seeded with.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultTier {
    pub quantity_from: i32,
    pub quantity_to: i32,
    pub price_per_ticket: Decimal,
    pub food_option: FoodOption,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricingConfig {
    pub default_tiers: Vec<DefaultTier>,
}

impl PricingConfig {
    /// A single flat tier per food option, covering `1..=max_quantity`.
    pub fn flat(max_quantity: i32, with_food: Decimal, without_food: Decimal) -> Self {
        let tier = |price_per_ticket, food_option| DefaultTier {
            quantity_from: 1,
            quantity_to: max_quantity,
            price_per_ticket,
            food_option,
        };
        Self {
            default_tiers: vec![
                tier(without_food, FoodOption::WithoutFood),
                tier(with_food, FoodOption::WithFood),
            ],
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self::flat(
            DEFAULT_TIER_MAX_QUANTITY,
            Decimal::from(DEFAULT_PRICE_WITH_FOOD),
            Decimal::from(DEFAULT_PRICE_WITHOUT_FOOD),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationConfig {
    pub max_ticket_quantity: i32,
    /// Added to the unit price of every ticket paid with the secondary payment method.
    pub secondary_payment_surcharge: Decimal,
    /// Re-resolve pricing after codes are issued and abort if the unit price moved.
    pub revalidate_pricing_before_commit: bool,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            max_ticket_quantity: 20,
            secondary_payment_surcharge: Decimal::ZERO,
            revalidate_pricing_before_commit: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportingConfig {
    pub leaderboard_size: usize,
    pub recent_checkins: usize,
    /// Team roles kept off the leaderboard.
    pub excluded_team_roles: Vec<String>,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            leaderboard_size: 3,
            recent_checkins: 5,
            excluded_team_roles: ["Director", "Secretary", "Vice President", "President"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let registration_defaults = RegistrationConfig::default();
        let reporting_defaults = ReportingConfig::default();

        let is_production = env::var("RUST_ENV")
            .map(|v| v.to_lowercase() == "production")
            .unwrap_or(false);

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: parsed_or("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            bind_addr: parsed_or("BIND_ADDR", parse_value("BIND_ADDR", DEFAULT_BIND_ADDR)?)?,
            http: HttpConfig {
                allowed_origins: split_origins(
                    &env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.to_string()),
                ),
                include_hsts: is_production,
            },
            storage: StorageConfig {
                base_url: required("STORAGE_URL")?.trim_end_matches('/').to_string(),
                service_key: required("STORAGE_SERVICE_KEY")?,
                bucket: env::var("STORAGE_BUCKET").unwrap_or_else(|_| DEFAULT_BUCKET.to_string()),
                timeout: Duration::from_secs(parsed_or("STORAGE_TIMEOUT_SECS", DEFAULT_STORAGE_TIMEOUT_SECS)?),
            },
            notifications: NotificationConfig {
                webhook_url: env::var("NOTIFY_WEBHOOK_URL").ok().filter(|v| !v.trim().is_empty()),
                timeout: Duration::from_secs(parsed_or("NOTIFY_TIMEOUT_SECS", DEFAULT_NOTIFY_TIMEOUT_SECS)?),
            },
            pricing: PricingConfig::flat(
                parsed_or("DEFAULT_TIER_MAX_QUANTITY", DEFAULT_TIER_MAX_QUANTITY)?,
                parsed_or("DEFAULT_PRICE_WITH_FOOD", Decimal::from(DEFAULT_PRICE_WITH_FOOD))?,
                parsed_or("DEFAULT_PRICE_WITHOUT_FOOD", Decimal::from(DEFAULT_PRICE_WITHOUT_FOOD))?,
            ),
            registration: RegistrationConfig {
                max_ticket_quantity: parsed_or("MAX_TICKET_QUANTITY", registration_defaults.max_ticket_quantity)?,
                secondary_payment_surcharge: parsed_or(
                    "SECONDARY_PAYMENT_SURCHARGE",
                    registration_defaults.secondary_payment_surcharge,
                )?,
                revalidate_pricing_before_commit: parsed_or(
                    "REVALIDATE_PRICING_BEFORE_COMMIT",
                    registration_defaults.revalidate_pricing_before_commit,
                )?,
            },
            reporting: ReportingConfig {
                leaderboard_size: parsed_or("LEADERBOARD_SIZE", reporting_defaults.leaderboard_size)?,
                recent_checkins: parsed_or("RECENT_CHECKINS", reporting_defaults.recent_checkins)?,
                ..reporting_defaults
            },
        })
    }
}

pub fn split_origins(origins: &str) -> Vec<String> {
    origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect()
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn parsed_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => parse_value(key, &value),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}
