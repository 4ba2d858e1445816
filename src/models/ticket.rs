use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pricing::{FoodOption, PaymentMethod};

/// One admission unit. A registration for `n` tickets produces `n` of these, each with its own
/// code and image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub payment_method: PaymentMethod,
    pub food_option: FoodOption,
    /// Always the unit price, never the total of the registration.
    pub price_per_ticket: Decimal,
    pub code: String,
    pub image_url: String,
    pub is_checked_in: bool,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A ticket that has been prepared (code issued, image stored) but not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTicket {
    pub event_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub payment_method: PaymentMethod,
    pub food_option: FoodOption,
    pub price_per_ticket: Decimal,
    pub code: String,
    pub image_url: String,
    pub created_by: Option<Uuid>,
}

impl NewTicket {
    pub fn into_ticket(self, id: Uuid, created_at: DateTime<Utc>) -> Ticket {
        Ticket {
            id,
            event_id: self.event_id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            payment_method: self.payment_method,
            food_option: self.food_option,
            price_per_ticket: self.price_per_ticket,
            code: self.code,
            image_url: self.image_url,
            is_checked_in: false,
            checked_in_at: None,
            created_by: self.created_by,
            created_at,
        }
    }
}
