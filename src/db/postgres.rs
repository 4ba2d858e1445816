use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use super::rows::{decode_all, PricingTierRow, TicketRow, VolunteerRow};
use super::{
    DbResult, EventRepository, PricingRepository, TicketQuery, TicketRepository, VolunteerRepository,
};
use crate::models::{
    Event, FoodOption, NewPricingTier, NewTicket, PricingTier, PricingTierUpdate, Ticket, Volunteer,
};

const TICKET_COLUMNS: &str = "id, event_id, name, email, phone, payment_method, food_option, price_per_ticket, \
                              code, image_url, is_checked_in, checked_in_at, created_by, created_at";

const TIER_COLUMNS: &str =
    "id, event_id, quantity_from, quantity_to, price_per_ticket, food_option, is_active, created_at, updated_at";

/// Postgres-backed implementation of every repository trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PgStore {
    async fn fetch_event(&self, event_id: Uuid) -> DbResult<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(
            "SELECT id, name, event_date, location, created_at FROM events WHERE id = $1",
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(event)
    }

    async fn current_event(&self) -> DbResult<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(
            "SELECT id, name, event_date, location, created_at FROM events ORDER BY created_at DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(event)
    }
}

#[async_trait]
impl PricingRepository for PgStore {
    async fn fetch_active_tiers(&self, event_id: Uuid, food_option: FoodOption) -> DbResult<Vec<PricingTier>> {
        let rows = sqlx::query_as::<_, PricingTierRow>(&format!(
            "SELECT {TIER_COLUMNS} FROM ticket_pricing \
             WHERE event_id = $1 AND food_option = $2 AND is_active = TRUE \
             ORDER BY quantity_from"
        ))
        .bind(event_id)
        .bind(food_option.as_str())
        .fetch_all(&self.pool)
        .await?;
        decode_all(rows)
    }

    async fn fetch_tiers(&self, event_id: Option<Uuid>) -> DbResult<Vec<PricingTier>> {
        let rows = sqlx::query_as::<_, PricingTierRow>(&format!(
            "SELECT {TIER_COLUMNS} FROM ticket_pricing \
             WHERE ($1::uuid IS NULL OR event_id = $1) \
             ORDER BY quantity_from"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        decode_all(rows)
    }

    async fn fetch_tier(&self, tier_id: Uuid) -> DbResult<Option<PricingTier>> {
        let row = sqlx::query_as::<_, PricingTierRow>(&format!(
            "SELECT {TIER_COLUMNS} FROM ticket_pricing WHERE id = $1"
        ))
        .bind(tier_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(PricingTier::try_from).transpose()
    }

    async fn insert_tier(&self, tier: NewPricingTier) -> DbResult<PricingTier> {
        let row = sqlx::query_as::<_, PricingTierRow>(&format!(
            "INSERT INTO ticket_pricing (event_id, quantity_from, quantity_to, price_per_ticket, food_option, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {TIER_COLUMNS}"
        ))
        .bind(tier.event_id)
        .bind(tier.quantity_from)
        .bind(tier.quantity_to)
        .bind(tier.price_per_ticket)
        .bind(tier.food_option.as_str())
        .bind(tier.is_active)
        .fetch_one(&self.pool)
        .await?;
        PricingTier::try_from(row)
    }

    async fn update_tier(&self, tier_id: Uuid, update: PricingTierUpdate) -> DbResult<Option<PricingTier>> {
        let row = sqlx::query_as::<_, PricingTierRow>(&format!(
            "UPDATE ticket_pricing SET \
               quantity_from = COALESCE($2, quantity_from), \
               quantity_to = COALESCE($3, quantity_to), \
               price_per_ticket = COALESCE($4, price_per_ticket), \
               food_option = COALESCE($5, food_option), \
               is_active = COALESCE($6, is_active), \
               updated_at = NOW() \
             WHERE id = $1 RETURNING {TIER_COLUMNS}"
        ))
        .bind(tier_id)
        .bind(update.quantity_from)
        .bind(update.quantity_to)
        .bind(update.price_per_ticket)
        .bind(update.food_option.map(|f| f.as_str()))
        .bind(update.is_active)
        .fetch_optional(&self.pool)
        .await?;
        row.map(PricingTier::try_from).transpose()
    }

    async fn delete_tier(&self, tier_id: Uuid) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM ticket_pricing WHERE id = $1")
            .bind(tier_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TicketRepository for PgStore {
    async fn insert_ticket(&self, ticket: NewTicket) -> DbResult<Ticket> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            "INSERT INTO tickets (event_id, name, email, phone, payment_method, food_option, price_per_ticket, \
                                  code, image_url, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {TICKET_COLUMNS}"
        ))
        .bind(ticket.event_id)
        .bind(&ticket.name)
        .bind(&ticket.email)
        .bind(&ticket.phone)
        .bind(ticket.payment_method.as_str())
        .bind(ticket.food_option.as_str())
        .bind(ticket.price_per_ticket)
        .bind(&ticket.code)
        .bind(&ticket.image_url)
        .bind(ticket.created_by)
        .fetch_one(&self.pool)
        .await?;
        Ticket::try_from(row)
    }

    async fn delete_ticket(&self, ticket_id: Uuid) -> DbResult<()> {
        sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(ticket_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn fetch_ticket_by_code(&self, code: &str) -> DbResult<Option<Ticket>> {
        let row = sqlx::query_as::<_, TicketRow>(&format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE code = $1"))
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Ticket::try_from).transpose()
    }

    async fn mark_checked_in(&self, code: &str, at: DateTime<Utc>) -> DbResult<Option<Ticket>> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            "UPDATE tickets SET is_checked_in = TRUE, checked_in_at = $2 \
             WHERE code = $1 AND is_checked_in = FALSE RETURNING {TICKET_COLUMNS}"
        ))
        .bind(code)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Ticket::try_from).transpose()
    }

    async fn search_tickets(&self, query: &TicketQuery) -> DbResult<(Vec<Ticket>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tickets WHERE TRUE");
        push_filters(&mut count, query);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE TRUE"));
        push_filters(&mut select, query);
        select.push(format!(
            " ORDER BY {} {} NULLS LAST, id",
            query.sort.column(),
            query.order.keyword()
        ));
        select.push(" LIMIT ").push_bind(query.limit);
        select.push(" OFFSET ").push_bind(query.offset);
        debug!(sql = select.sql(), "Searching tickets");

        let rows = select.build_query_as::<TicketRow>().fetch_all(&self.pool).await?;
        Ok((decode_all(rows)?, total))
    }

    async fn fetch_all_tickets(&self) -> DbResult<Vec<Ticket>> {
        let rows = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?;
        decode_all(rows)
    }
}

#[async_trait]
impl VolunteerRepository for PgStore {
    async fn fetch_volunteers(&self) -> DbResult<Vec<Volunteer>> {
        let rows = sqlx::query_as::<_, VolunteerRow>(
            "SELECT id, full_name, email, role, team_role, cleared_amount FROM users ORDER BY full_name",
        )
        .fetch_all(&self.pool)
        .await?;
        decode_all(rows)
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &TicketQuery) {
    if let Some(checked_in) = query.checked_in {
        builder.push(" AND is_checked_in = ").push_bind(checked_in);
    }
    if let Some(food_option) = query.food_option {
        builder.push(" AND food_option = ").push_bind(food_option.as_str());
    }
    if let Some(created_by) = query.created_by {
        builder.push(" AND created_by = ").push_bind(created_by);
    }
    if let Some(search) = &query.search {
        let pattern = format!("%{search}%");
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}
