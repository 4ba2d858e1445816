use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::config::ReportingConfig;
use crate::db::{DatastoreError, TicketRepository, VolunteerRepository};
use crate::models::{PaymentMethod, Role, Ticket, Volunteer};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolunteerSummary {
    pub volunteer_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub team_role: Option<String>,
    pub user_role: Role,
    pub total_attendees: usize,
    pub cash_count: usize,
    pub cash_amount: Decimal,
    pub zelle_count: usize,
    pub zelle_amount: Decimal,
    pub total_collected: Decimal,
    pub cleared_amount: Decimal,
    pub pending_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub volunteer_id: Uuid,
    pub full_name: String,
    pub team_role: Option<String>,
    pub tickets_sold: usize,
    pub rank: usize,
    pub is_current_user: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaderboard {
    pub top_volunteers: Vec<LeaderboardEntry>,
    pub current_user_rank: Option<LeaderboardEntry>,
    pub total_volunteers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventStats {
    pub total_registered: usize,
    pub total_checked_in: usize,
    pub checked_in_percentage: Decimal,
    pub total_tickets_sold: usize,
    pub total_revenue: Decimal,
    pub revenue_cash: Decimal,
    pub revenue_zelle: Decimal,
    pub recent_checkins: Vec<Ticket>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Sales {
    tickets: usize,
    cash_count: usize,
    cash_amount: Decimal,
    zelle_count: usize,
    zelle_amount: Decimal,
}

impl Sales {
    fn add(&mut self, ticket: &Ticket) {
        self.tickets += 1;
        match ticket.payment_method {
            PaymentMethod::Cash => {
                self.cash_count += 1;
                self.cash_amount += ticket.price_per_ticket;
            }
            PaymentMethod::Zelle => {
                self.zelle_count += 1;
                self.zelle_amount += ticket.price_per_ticket;
            }
        }
    }
}

fn sales_by_volunteer(tickets: &[Ticket]) -> HashMap<Uuid, Sales> {
    let mut sales: HashMap<Uuid, Sales> = HashMap::new();
    for ticket in tickets {
        if let Some(volunteer_id) = ticket.created_by {
            sales.entry(volunteer_id).or_default().add(ticket);
        }
    }
    sales
}

pub fn volunteer_summaries(volunteers: &[Volunteer], tickets: &[Ticket]) -> Vec<VolunteerSummary> {
    let sales = sales_by_volunteer(tickets);
    volunteers
        .iter()
        .map(|v| {
            let s = sales.get(&v.id).copied().unwrap_or_default();
            let total_collected = s.cash_amount + s.zelle_amount;
            VolunteerSummary {
                volunteer_id: v.id,
                full_name: v.full_name.clone(),
                email: v.email.clone(),
                team_role: v
                    .role
                    .display_title()
                    .map(String::from)
                    .or_else(|| v.team_role.clone()),
                user_role: v.role,
                total_attendees: s.tickets,
                cash_count: s.cash_count,
                cash_amount: s.cash_amount,
                zelle_count: s.zelle_count,
                zelle_amount: s.zelle_amount,
                total_collected,
                cleared_amount: v.cleared_amount,
                pending_amount: total_collected - v.cleared_amount,
            }
        })
        .collect()
}

/// Sorts by tickets sold, descending, keeping input order among equals, then assigns competition
/// ranks: equal counts share a rank and the next distinct count skips ahead (1, 1, 3).
pub fn rank(mut entries: Vec<LeaderboardEntry>) -> Vec<LeaderboardEntry> {
    entries.sort_by_key(|e| Reverse(e.tickets_sold));
    let mut rank = 1;
    for i in 0..entries.len() {
        if i > 0 && entries[i].tickets_sold != entries[i - 1].tickets_sold {
            rank = i + 1;
        }
        entries[i].rank = rank;
    }
    entries
}

pub fn leaderboard(
    volunteers: &[Volunteer],
    tickets: &[Ticket],
    current_user: Option<Uuid>,
    config: &ReportingConfig,
) -> Leaderboard {
    let sales = sales_by_volunteer(tickets);
    let eligible = |v: &Volunteer| {
        v.role == Role::Volunteer
            && v
                .team_role
                .as_deref()
                .is_some_and(|team| !config.excluded_team_roles.iter().any(|x| x == team))
    };

    let entries = volunteers
        .iter()
        .filter(|v| eligible(v) || Some(v.id) == current_user)
        .map(|v| LeaderboardEntry {
            volunteer_id: v.id,
            full_name: v.full_name.clone(),
            team_role: v.team_role.clone(),
            tickets_sold: sales.get(&v.id).map_or(0, |s| s.tickets),
            rank: 0,
            is_current_user: Some(v.id) == current_user,
        })
        .collect();
    let ranked = rank(entries);

    Leaderboard {
        top_volunteers: ranked.iter().take(config.leaderboard_size).cloned().collect(),
        current_user_rank: ranked.iter().find(|e| e.is_current_user).cloned(),
        total_volunteers: ranked.len(),
    }
}

pub fn event_stats(tickets: &[Ticket], recent_limit: usize) -> EventStats {
    let mut revenue_cash = Decimal::ZERO;
    let mut revenue_zelle = Decimal::ZERO;
    for ticket in tickets {
        match ticket.payment_method {
            PaymentMethod::Cash => revenue_cash += ticket.price_per_ticket,
            PaymentMethod::Zelle => revenue_zelle += ticket.price_per_ticket,
        }
    }

    let total_registered = tickets.len();
    let mut checked_in: Vec<&Ticket> = tickets.iter().filter(|t| t.is_checked_in).collect();
    let total_checked_in = checked_in.len();
    let checked_in_percentage = if total_registered == 0 {
        Decimal::ZERO
    } else {
        (Decimal::from(total_checked_in) * Decimal::ONE_HUNDRED / Decimal::from(total_registered)).round_dp(2)
    };

    checked_in.sort_by_key(|t| Reverse(t.checked_in_at));

    EventStats {
        total_registered,
        total_checked_in,
        checked_in_percentage,
        // One row per ticket.
        total_tickets_sold: total_registered,
        total_revenue: revenue_cash + revenue_zelle,
        revenue_cash,
        revenue_zelle,
        recent_checkins: checked_in.into_iter().take(recent_limit).cloned().collect(),
    }
}

/// Read-only aggregates over persisted tickets.
pub struct ReportingViews {
    tickets: Arc<dyn TicketRepository>,
    volunteers: Arc<dyn VolunteerRepository>,
    config: ReportingConfig,
}

impl ReportingViews {
    pub fn new(
        tickets: Arc<dyn TicketRepository>,
        volunteers: Arc<dyn VolunteerRepository>,
        config: ReportingConfig,
    ) -> Self {
        Self {
            tickets,
            volunteers,
            config,
        }
    }

    pub async fn volunteer_summary(&self) -> Result<Vec<VolunteerSummary>, DatastoreError> {
        let volunteers = self.volunteers.fetch_volunteers().await?;
        let tickets = self.tickets.fetch_all_tickets().await?;
        Ok(volunteer_summaries(&volunteers, &tickets))
    }

    pub async fn leaderboard(&self, current_user: Option<Uuid>) -> Result<Leaderboard, DatastoreError> {
        let volunteers = self.volunteers.fetch_volunteers().await?;
        let tickets = self.tickets.fetch_all_tickets().await?;
        Ok(leaderboard(&volunteers, &tickets, current_user, &self.config))
    }

    pub async fn event_stats(&self) -> Result<EventStats, DatastoreError> {
        let tickets = self.tickets.fetch_all_tickets().await?;
        Ok(event_stats(&tickets, self.config.recent_checkins))
    }
}
