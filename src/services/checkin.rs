use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::db::{DatastoreError, TicketRepository};
use crate::models::Ticket;
use crate::notify::{Notification, NotificationDispatcher};

#[derive(Debug, Error)]
pub enum CheckInError {
    #[error("Ticket not found")]
    NotFound(String),

    #[error(transparent)]
    Datastore(#[from] DatastoreError),
}

/// Result of a check-in attempt. A ticket moves from issued to checked in exactly once; every
/// later attempt reports `AlreadyCheckedIn` and changes nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckInOutcome {
    CheckedIn(Ticket),
    AlreadyCheckedIn(Ticket),
}

impl CheckInOutcome {
    pub fn is_first_check_in(&self) -> bool {
        matches!(self, CheckInOutcome::CheckedIn(_))
    }

    pub fn message(&self) -> &'static str {
        match self {
            CheckInOutcome::CheckedIn(_) => "Check-in successful",
            CheckInOutcome::AlreadyCheckedIn(_) => "already checked in",
        }
    }

    pub fn ticket(&self) -> &Ticket {
        match self {
            CheckInOutcome::CheckedIn(t) | CheckInOutcome::AlreadyCheckedIn(t) => t,
        }
    }

    pub fn into_ticket(self) -> Ticket {
        match self {
            CheckInOutcome::CheckedIn(t) | CheckInOutcome::AlreadyCheckedIn(t) => t,
        }
    }
}

pub struct CheckInService {
    tickets: Arc<dyn TicketRepository>,
    notifications: NotificationDispatcher,
}

impl CheckInService {
    pub fn new(tickets: Arc<dyn TicketRepository>, notifications: NotificationDispatcher) -> Self {
        Self { tickets, notifications }
    }

    pub async fn lookup(&self, code: &str) -> Result<Ticket, CheckInError> {
        self.tickets
            .fetch_ticket_by_code(code.trim())
            .await?
            .ok_or_else(|| CheckInError::NotFound(code.to_string()))
    }

    pub async fn check_in(&self, code: &str) -> Result<CheckInOutcome, CheckInError> {
        let ticket = self.lookup(code).await?;
        if ticket.is_checked_in {
            info!(ticket_id = %ticket.id, "Ticket already checked in");
            return Ok(CheckInOutcome::AlreadyCheckedIn(ticket));
        }

        // Conditional on is_checked_in = false, so concurrent scans of one code cannot both win.
        match self.tickets.mark_checked_in(&ticket.code, Utc::now()).await? {
            Some(updated) => {
                info!(ticket_id = %updated.id, "Ticket checked in");
                if let Some(checked_in_at) = updated.checked_in_at {
                    self.notifications.dispatch(
                        updated.email.clone(),
                        Notification::CheckInConfirmation {
                            name: updated.name.clone(),
                            checked_in_at,
                        },
                    );
                }
                Ok(CheckInOutcome::CheckedIn(updated))
            }
            None => {
                warn!(ticket_id = %ticket.id, "Lost check-in race to a concurrent scan");
                let current = self.lookup(&ticket.code).await?;
                Ok(CheckInOutcome::AlreadyCheckedIn(current))
            }
        }
    }
}
