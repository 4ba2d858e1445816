use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::{DefaultTier, PricingConfig};
use crate::db::{DatastoreError, PricingRepository};
use crate::models::{FoodOption, NewPricingTier, PricingTier, PricingTierUpdate};

#[derive(Debug, Error)]
pub enum TierError {
    #[error("{0}")]
    InvalidRange(String),

    #[error("Pricing tier range overlaps with existing tier")]
    Overlap { existing: Uuid },

    #[error("Pricing tier not found")]
    NotFound(Uuid),

    #[error("Pricing tiers already exist for this event")]
    AlreadySeeded(Uuid),

    #[error(transparent)]
    Datastore(#[from] DatastoreError),
}

/// Administrative management of pricing tiers. Non-overlap of ranges within an (event, food
/// option) pair is enforced here, at write time only.
pub struct TierAdmin {
    tiers: Arc<dyn PricingRepository>,
    default_tiers: Vec<DefaultTier>,
}

impl TierAdmin {
    pub fn new(tiers: Arc<dyn PricingRepository>, config: &PricingConfig) -> Self {
        Self {
            tiers,
            default_tiers: config.default_tiers.clone(),
        }
    }

    pub async fn list(
        &self,
        event_id: Option<Uuid>,
        food_option: Option<FoodOption>,
    ) -> Result<Vec<PricingTier>, TierError> {
        let tiers = self.tiers.fetch_tiers(event_id).await?;
        Ok(tiers
            .into_iter()
            .filter(|t| food_option.map_or(true, |f| t.food_option == f))
            .collect())
    }

    pub async fn create(&self, tier: NewPricingTier) -> Result<PricingTier, TierError> {
        validate_range(tier.quantity_from, tier.quantity_to, tier.price_per_ticket)?;
        let existing = self.tiers.fetch_tiers(Some(tier.event_id)).await?;
        check_overlap(&existing, None, tier.food_option, tier.quantity_from, tier.quantity_to)?;

        let created = self.tiers.insert_tier(tier).await?;
        info!(
            tier_id = %created.id,
            event_id = %created.event_id,
            quantity_from = created.quantity_from,
            quantity_to = created.quantity_to,
            "Created pricing tier"
        );
        Ok(created)
    }

    pub async fn update(&self, tier_id: Uuid, update: PricingTierUpdate) -> Result<PricingTier, TierError> {
        let current = self.tiers.fetch_tier(tier_id).await?.ok_or(TierError::NotFound(tier_id))?;
        let proposed = update.apply_to(&current);
        validate_range(proposed.quantity_from, proposed.quantity_to, proposed.price_per_ticket)?;

        let existing = self.tiers.fetch_tiers(Some(current.event_id)).await?;
        check_overlap(
            &existing,
            Some(tier_id),
            proposed.food_option,
            proposed.quantity_from,
            proposed.quantity_to,
        )?;

        let updated = self
            .tiers
            .update_tier(tier_id, update)
            .await?
            .ok_or(TierError::NotFound(tier_id))?;
        info!(tier_id = %tier_id, "Updated pricing tier");
        Ok(updated)
    }

    /// Seeds an event that has no tiers yet with the configured default set. Any tier, active or
    /// not, counts as already seeded. A failed insert removes the tiers created before it.
    pub async fn create_defaults(&self, event_id: Uuid) -> Result<Vec<PricingTier>, TierError> {
        if !self.tiers.fetch_tiers(Some(event_id)).await?.is_empty() {
            return Err(TierError::AlreadySeeded(event_id));
        }
        for (i, tier) in self.default_tiers.iter().enumerate() {
            validate_range(tier.quantity_from, tier.quantity_to, tier.price_per_ticket)?;
            let others = &self.default_tiers[..i];
            if let Some(clash) = others
                .iter()
                .find(|t| t.food_option == tier.food_option && ranges_overlap(t, tier))
            {
                return Err(TierError::InvalidRange(format!(
                    "Default tiers {}-{} and {}-{} overlap",
                    clash.quantity_from, clash.quantity_to, tier.quantity_from, tier.quantity_to
                )));
            }
        }

        let mut created: Vec<PricingTier> = Vec::with_capacity(self.default_tiers.len());
        for tier in &self.default_tiers {
            let new = NewPricingTier {
                event_id,
                quantity_from: tier.quantity_from,
                quantity_to: tier.quantity_to,
                price_per_ticket: tier.price_per_ticket,
                food_option: tier.food_option,
                is_active: true,
            };
            match self.tiers.insert_tier(new).await {
                Ok(tier) => created.push(tier),
                Err(e) => {
                    for tier in &created {
                        if let Err(rollback) = self.tiers.delete_tier(tier.id).await {
                            error!(tier_id = %tier.id, error = %rollback, "Failed to roll back default tier");
                        }
                    }
                    return Err(e.into());
                }
            }
        }
        info!(%event_id, count = created.len(), "Created default pricing tiers");
        Ok(created)
    }

    pub async fn delete(&self, tier_id: Uuid) -> Result<(), TierError> {
        if !self.tiers.delete_tier(tier_id).await? {
            return Err(TierError::NotFound(tier_id));
        }
        info!(tier_id = %tier_id, "Deleted pricing tier");
        Ok(())
    }
}

fn validate_range(quantity_from: i32, quantity_to: i32, price: Decimal) -> Result<(), TierError> {
    if quantity_from < 1 {
        return Err(TierError::InvalidRange("quantity_from must be at least 1".to_string()));
    }
    if quantity_to < quantity_from {
        return Err(TierError::InvalidRange(
            "quantity_to must be greater than or equal to quantity_from".to_string(),
        ));
    }
    if price.is_sign_negative() {
        return Err(TierError::InvalidRange("price_per_ticket cannot be negative".to_string()));
    }
    Ok(())
}

fn ranges_overlap(a: &DefaultTier, b: &DefaultTier) -> bool {
    a.quantity_from <= b.quantity_to && b.quantity_from <= a.quantity_to
}

fn check_overlap(
    existing: &[PricingTier],
    skip: Option<Uuid>,
    food_option: FoodOption,
    quantity_from: i32,
    quantity_to: i32,
) -> Result<(), TierError> {
    match existing
        .iter()
        .filter(|t| Some(t.id) != skip && t.food_option == food_option)
        .find(|t| t.overlaps(quantity_from, quantity_to))
    {
        Some(clash) => Err(TierError::Overlap { existing: clash.id }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;

    fn admin(store: MemoryStore) -> TierAdmin {
        TierAdmin::new(Arc::new(store), &PricingConfig::default())
    }

    fn new_tier(event_id: Uuid, from: i32, to: i32, food_option: FoodOption) -> NewPricingTier {
        NewPricingTier {
            event_id,
            quantity_from: from,
            quantity_to: to,
            price_per_ticket: Decimal::from(15),
            food_option,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_rejects_overlap_for_same_food_option() {
        let (store, event_id) = MemoryStore::with_event();
        let admin = admin(store);
        admin.create(new_tier(event_id, 1, 5, FoodOption::WithFood)).await.unwrap();

        let err = admin
            .create(new_tier(event_id, 5, 10, FoodOption::WithFood))
            .await
            .unwrap_err();
        assert!(matches!(err, TierError::Overlap { .. }));

        // Same range for the other food option is allowed.
        admin
            .create(new_tier(event_id, 1, 5, FoodOption::WithoutFood))
            .await
            .unwrap();
        admin.create(new_tier(event_id, 6, 20, FoodOption::WithFood)).await.unwrap();
        assert_eq!(admin.list(Some(event_id), None).await.unwrap().len(), 3);
        assert_eq!(
            admin
                .list(Some(event_id), Some(FoodOption::WithFood))
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn test_rejects_inverted_range() {
        let (store, event_id) = MemoryStore::with_event();
        let admin = admin(store);
        let err = admin
            .create(new_tier(event_id, 6, 2, FoodOption::WithFood))
            .await
            .unwrap_err();
        assert!(matches!(err, TierError::InvalidRange(_)));
    }

    #[tokio::test]
    async fn test_update_may_keep_its_own_range() {
        let (store, event_id) = MemoryStore::with_event();
        let admin = admin(store);
        let tier = admin.create(new_tier(event_id, 1, 5, FoodOption::WithFood)).await.unwrap();
        admin.create(new_tier(event_id, 6, 10, FoodOption::WithFood)).await.unwrap();

        let updated = admin
            .update(
                tier.id,
                PricingTierUpdate {
                    price_per_ticket: Some(Decimal::from(14)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price_per_ticket, Decimal::from(14));

        let err = admin
            .update(
                tier.id,
                PricingTierUpdate {
                    quantity_to: Some(7),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TierError::Overlap { .. }));
    }

    #[tokio::test]
    async fn test_unknown_tier() {
        let (store, _) = MemoryStore::with_event();
        let admin = admin(store);
        let id = Uuid::new_v4();
        assert!(matches!(admin.delete(id).await, Err(TierError::NotFound(_))));
        assert!(matches!(
            admin.update(id, PricingTierUpdate::default()).await,
            Err(TierError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_defaults_seeds_one_tier_per_food_option() {
        let (store, event_id) = MemoryStore::with_event();
        let admin = admin(store);

        let created = admin.create_defaults(event_id).await.unwrap();
        assert_eq!(created.len(), 2);
        let with_food = created.iter().find(|t| t.food_option == FoodOption::WithFood).unwrap();
        assert_eq!((with_food.quantity_from, with_food.quantity_to), (1, 251));
        assert_eq!(with_food.price_per_ticket, Decimal::from(18));
        assert!(created.iter().all(|t| t.event_id == event_id && t.is_active));

        let listed = admin.list(Some(event_id), Some(FoodOption::WithoutFood)).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].price_per_ticket, Decimal::from(15));
    }

    #[tokio::test]
    async fn test_create_defaults_refuses_seeded_event() {
        let (store, event_id) = MemoryStore::with_event();
        let mut inactive = new_tier(event_id, 1, 5, FoodOption::WithFood);
        inactive.is_active = false;
        let admin = admin(store);
        admin.create(inactive).await.unwrap();

        let err = admin.create_defaults(event_id).await.unwrap_err();
        assert!(matches!(err, TierError::AlreadySeeded(id) if id == event_id));
        assert_eq!(admin.list(Some(event_id), None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_defaults_rejects_overlapping_configuration() {
        let (store, event_id) = MemoryStore::with_event();
        let mut config = PricingConfig::default();
        config.default_tiers.push(DefaultTier {
            quantity_from: 100,
            quantity_to: 300,
            price_per_ticket: Decimal::from(10),
            food_option: FoodOption::WithFood,
        });
        let admin = TierAdmin::new(Arc::new(store), &config);

        let err = admin.create_defaults(event_id).await.unwrap_err();
        assert!(matches!(err, TierError::InvalidRange(_)));
        assert!(admin.list(Some(event_id), None).await.unwrap().is_empty());
    }
}
