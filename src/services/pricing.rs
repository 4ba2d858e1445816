use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::config::RegistrationConfig;
use crate::db::{DatastoreError, PricingRepository};
use crate::models::{FoodOption, PaymentMethod, PricingTier};

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("No pricing tiers found for this event")]
    NoPricingConfigured,

    #[error("No pricing tier found for the specified quantity")]
    NoTierForQuantity { quantity: i32 },

    #[error(transparent)]
    Datastore(#[from] DatastoreError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceQuote {
    pub quantity: i32,
    /// Tier price before any payment method surcharge.
    pub base_price: Decimal,
    pub surcharge: Decimal,
    pub price_per_ticket: Decimal,
    pub total_price: Decimal,
    pub tier: PricingTier,
}

/// Resolves the unit price of a registration from the event's active quantity tiers.
pub struct PricingResolver {
    tiers: Arc<dyn PricingRepository>,
    secondary_payment_surcharge: Decimal,
}

impl PricingResolver {
    pub fn new(tiers: Arc<dyn PricingRepository>, config: &RegistrationConfig) -> Self {
        Self {
            tiers,
            secondary_payment_surcharge: config.secondary_payment_surcharge,
        }
    }

    /// Tier lookup is a plain snapshot read. A tier edited concurrently with this call may or may
    /// not be seen.
    pub async fn resolve(
        &self,
        event_id: Uuid,
        quantity: i32,
        food_option: FoodOption,
        payment_method: PaymentMethod,
    ) -> Result<PriceQuote, PricingError> {
        let tiers = self.tiers.fetch_active_tiers(event_id, food_option).await?;
        if tiers.is_empty() {
            return Err(PricingError::NoPricingConfigured);
        }
        let tier = select_tier(&tiers, quantity).ok_or(PricingError::NoTierForQuantity { quantity })?;

        let surcharge = if payment_method.is_secondary() {
            self.secondary_payment_surcharge
        } else {
            Decimal::ZERO
        };
        let price_per_ticket = tier.price_per_ticket + surcharge;
        let quote = PriceQuote {
            quantity,
            base_price: tier.price_per_ticket,
            surcharge,
            price_per_ticket,
            total_price: price_per_ticket * Decimal::from(quantity),
            tier: tier.clone(),
        };
        debug!(
            %event_id,
            quantity,
            food_option = %food_option,
            payment_method = %payment_method,
            price_per_ticket = %quote.price_per_ticket,
            "Resolved ticket price"
        );
        Ok(quote)
    }
}

/// First tier, in `quantity_from` order, whose inclusive range contains `quantity`.
pub fn select_tier(tiers: &[PricingTier], quantity: i32) -> Option<&PricingTier> {
    tiers.iter().find(|t| t.covers(quantity))
}
