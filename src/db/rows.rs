use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use super::DatastoreError;
use crate::models::{PricingTier, Ticket, Volunteer};

#[derive(Debug, FromRow)]
pub(super) struct PricingTierRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub quantity_from: i32,
    pub quantity_to: i32,
    pub price_per_ticket: Decimal,
    pub food_option: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PricingTierRow> for PricingTier {
    type Error = DatastoreError;

    fn try_from(row: PricingTierRow) -> Result<Self, Self::Error> {
        let food_option = row
            .food_option
            .parse()
            .map_err(|e: String| DatastoreError::malformed("ticket_pricing", e))?;
        Ok(PricingTier {
            id: row.id,
            event_id: row.event_id,
            quantity_from: row.quantity_from,
            quantity_to: row.quantity_to,
            price_per_ticket: row.price_per_ticket,
            food_option,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(super) struct TicketRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub payment_method: String,
    pub food_option: String,
    pub price_per_ticket: Decimal,
    pub code: String,
    pub image_url: String,
    pub is_checked_in: bool,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = DatastoreError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let payment_method = row
            .payment_method
            .parse()
            .map_err(|e: String| DatastoreError::malformed("tickets", e))?;
        let food_option = row
            .food_option
            .parse()
            .map_err(|e: String| DatastoreError::malformed("tickets", e))?;
        Ok(Ticket {
            id: row.id,
            event_id: row.event_id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            payment_method,
            food_option,
            price_per_ticket: row.price_per_ticket,
            code: row.code,
            image_url: row.image_url,
            is_checked_in: row.is_checked_in,
            checked_in_at: row.checked_in_at,
            created_by: row.created_by,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(super) struct VolunteerRow {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub team_role: Option<String>,
    pub cleared_amount: Decimal,
}

impl TryFrom<VolunteerRow> for Volunteer {
    type Error = DatastoreError;

    fn try_from(row: VolunteerRow) -> Result<Self, Self::Error> {
        let role = row.role.parse().map_err(|e: String| DatastoreError::malformed("users", e))?;
        Ok(Volunteer {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            role,
            team_role: row.team_role,
            cleared_amount: row.cleared_amount,
        })
    }
}

pub(super) fn decode_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, DatastoreError>
where
    T: TryFrom<R, Error = DatastoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}
