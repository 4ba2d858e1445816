//! The relational datastore as seen by the core services.
//!
//! Every method returns typed records. Raw rows are decoded inside the implementation right after
//! the query, so nothing loosely typed ever reaches the services.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{
    Event, FoodOption, NewPricingTier, NewTicket, PricingTier, PricingTierUpdate, Ticket, Volunteer,
};

pub mod errors;
pub mod postgres;
mod rows;

pub use errors::DatastoreError;
pub use postgres::PgStore;

pub type DbResult<T> = Result<T, DatastoreError>;

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn fetch_event(&self, event_id: Uuid) -> DbResult<Option<Event>>;

    /// The most recently created event, used when a request does not name one.
    async fn current_event(&self) -> DbResult<Option<Event>>;
}

#[async_trait]
pub trait PricingRepository: Send + Sync {
    /// Active tiers for the event and food option, ordered by `quantity_from`.
    async fn fetch_active_tiers(&self, event_id: Uuid, food_option: FoodOption) -> DbResult<Vec<PricingTier>>;

    /// All tiers (active or not) for the event, ordered by `quantity_from`.
    async fn fetch_tiers(&self, event_id: Option<Uuid>) -> DbResult<Vec<PricingTier>>;

    async fn fetch_tier(&self, tier_id: Uuid) -> DbResult<Option<PricingTier>>;

    async fn insert_tier(&self, tier: NewPricingTier) -> DbResult<PricingTier>;

    async fn update_tier(&self, tier_id: Uuid, update: PricingTierUpdate) -> DbResult<Option<PricingTier>>;

    /// Returns false when no tier with this id existed.
    async fn delete_tier(&self, tier_id: Uuid) -> DbResult<bool>;
}

#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn insert_ticket(&self, ticket: NewTicket) -> DbResult<Ticket>;

    async fn delete_ticket(&self, ticket_id: Uuid) -> DbResult<()>;

    async fn fetch_ticket_by_code(&self, code: &str) -> DbResult<Option<Ticket>>;

    /// Marks the ticket checked in only if it is not already. Returns `None` when no row matched
    /// the `code = $1 AND is_checked_in = false` predicate.
    async fn mark_checked_in(&self, code: &str, at: DateTime<Utc>) -> DbResult<Option<Ticket>>;

    /// Page of tickets plus the total number of rows matching the filter.
    async fn search_tickets(&self, query: &TicketQuery) -> DbResult<(Vec<Ticket>, i64)>;

    /// Every ticket, for the reporting aggregates.
    async fn fetch_all_tickets(&self) -> DbResult<Vec<Ticket>>;
}

#[async_trait]
pub trait VolunteerRepository: Send + Sync {
    async fn fetch_volunteers(&self) -> DbResult<Vec<Volunteer>>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketSort {
    #[default]
    CreatedAt,
    Name,
    CheckedInAt,
}

impl TicketSort {
    pub fn column(&self) -> &'static str {
        match self {
            TicketSort::CreatedAt => "created_at",
            TicketSort::Name => "name",
            TicketSort::CheckedInAt => "checked_in_at",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TicketQuery {
    pub checked_in: Option<bool>,
    /// Case-insensitive substring match on name or email.
    pub search: Option<String>,
    pub food_option: Option<FoodOption>,
    pub created_by: Option<Uuid>,
    pub sort: TicketSort,
    pub order: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

impl TicketQuery {
    pub fn matches(&self, ticket: &Ticket) -> bool {
        if let Some(checked_in) = self.checked_in {
            if ticket.is_checked_in != checked_in {
                return false;
            }
        }
        if let Some(food_option) = self.food_option {
            if ticket.food_option != food_option {
                return false;
            }
        }
        if let Some(created_by) = self.created_by {
            if ticket.created_by != Some(created_by) {
                return false;
            }
        }
        match &self.search {
            Some(term) => {
                let term = term.to_lowercase();
                ticket.name.to_lowercase().contains(&term) || ticket.email.to_lowercase().contains(&term)
            }
            None => true,
        }
    }
}
