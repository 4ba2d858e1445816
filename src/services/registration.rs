//! All-or-nothing issuance of the tickets of one registration.
//!
//! Object storage and the datastore share no transaction, so atomicity comes from compensation:
//!
//! 1. Prepare: resolve the price once, then issue one code per ticket. If issuing ticket `k`
//!    fails, the codes of tickets `1..k` are deleted.
//! 2. Commit: insert the prepared rows one by one. If row `j` fails, rows `1..j` are deleted and
//!    then every issued code.
//! 3. Notify: hand the codes to the notification channel in the background. Nothing here can undo
//!    a commit.
//!
//! Rollback steps are best effort. Their failures are logged and leave the error returned to the
//! caller unchanged.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::codes::{CodeIssueError, TicketCodeIssuer};
use super::pricing::{PriceQuote, PricingError, PricingResolver};
use crate::config::RegistrationConfig;
use crate::db::{DatastoreError, EventRepository, TicketRepository};
use crate::models::{FoodOption, NewTicket, PaymentMethod, Ticket};
use crate::notify::{IssuedTicket, Notification, NotificationDispatcher};

const MIN_PHONE_DIGITS: usize = 10;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("{0}")]
    Validation(String),

    #[error("No event found for registration")]
    NoEvent,

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("Ticket pricing changed during registration. Please try again.")]
    PricingChanged { quoted: Decimal, current: Decimal },

    #[error("Failed to prepare ticket {index} of {quantity}. Please try again.")]
    Prepare {
        index: usize,
        quantity: usize,
        #[source]
        source: CodeIssueError,
    },

    #[error("Failed to create registration records. Please try again.")]
    Commit {
        #[source]
        source: DatastoreError,
    },

    #[error(transparent)]
    Datastore(#[from] DatastoreError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub ticket_quantity: i32,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default = "default_food_option")]
    pub food_option: FoodOption,
    #[serde(default)]
    pub event_id: Option<Uuid>,
}

fn default_food_option() -> FoodOption {
    FoodOption::WithFood
}

/// What the caller gets back. Ticket codes are deliberately absent: they only ever travel
/// through the notification channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrationSummary {
    pub event_id: Uuid,
    pub name: String,
    pub email: String,
    pub ticket_quantity: i32,
    pub food_option: FoodOption,
    pub payment_method: PaymentMethod,
    pub price_per_ticket: Decimal,
    pub total_price: Decimal,
}

#[derive(Debug, Clone)]
struct Buyer {
    name: String,
    email: String,
    phone: String,
}

pub struct RegistrationCoordinator {
    config: RegistrationConfig,
    events: Arc<dyn EventRepository>,
    pricing: Arc<PricingResolver>,
    issuer: Arc<TicketCodeIssuer>,
    tickets: Arc<dyn TicketRepository>,
    notifications: NotificationDispatcher,
}

impl RegistrationCoordinator {
    pub fn new(
        config: RegistrationConfig,
        events: Arc<dyn EventRepository>,
        pricing: Arc<PricingResolver>,
        issuer: Arc<TicketCodeIssuer>,
        tickets: Arc<dyn TicketRepository>,
        notifications: NotificationDispatcher,
    ) -> Self {
        Self {
            config,
            events,
            pricing,
            issuer,
            tickets,
            notifications,
        }
    }

    pub async fn register(
        &self,
        request: RegistrationRequest,
        created_by: Option<Uuid>,
    ) -> Result<RegistrationSummary, RegistrationError> {
        let buyer = validate_request(&request, self.config.max_ticket_quantity)?;
        let event_id = self.resolve_event(request.event_id).await?;
        let quote = self
            .pricing
            .resolve(event_id, request.ticket_quantity, request.food_option, request.payment_method)
            .await?;

        info!(
            %event_id,
            quantity = request.ticket_quantity,
            total_price = %quote.total_price,
            "Preparing tickets"
        );
        let prepared = self.prepare(&buyer, &request, event_id, &quote, created_by).await?;

        if self.config.revalidate_pricing_before_commit {
            self.recheck_pricing(&request, event_id, &quote, &prepared).await?;
        }

        let created = self.commit(&prepared).await?;
        info!(%event_id, quantity = created.len(), "Registration committed");

        self.notify(&buyer, &created, &quote);

        Ok(RegistrationSummary {
            event_id,
            name: buyer.name,
            email: buyer.email,
            ticket_quantity: request.ticket_quantity,
            food_option: request.food_option,
            payment_method: request.payment_method,
            price_per_ticket: quote.price_per_ticket,
            total_price: quote.total_price,
        })
    }

    async fn resolve_event(&self, event_id: Option<Uuid>) -> Result<Uuid, RegistrationError> {
        let event = match event_id {
            Some(id) => self.events.fetch_event(id).await?,
            None => self.events.current_event().await?,
        };
        event.map(|e| e.id).ok_or(RegistrationError::NoEvent)
    }

    async fn prepare(
        &self,
        buyer: &Buyer,
        request: &RegistrationRequest,
        event_id: Uuid,
        quote: &PriceQuote,
        created_by: Option<Uuid>,
    ) -> Result<Vec<NewTicket>, RegistrationError> {
        let quantity = request.ticket_quantity as usize;
        let mut prepared: Vec<NewTicket> = Vec::with_capacity(quantity);

        for index in 1..=quantity {
            match self.issuer.issue().await {
                Ok(issued) => {
                    prepared.push(NewTicket {
                        event_id,
                        name: buyer.name.clone(),
                        email: buyer.email.clone(),
                        phone: buyer.phone.clone(),
                        payment_method: request.payment_method,
                        food_option: request.food_option,
                        price_per_ticket: quote.price_per_ticket,
                        code: issued.code,
                        image_url: issued.image_url,
                        created_by,
                    });
                    info!(ticket_index = index, quantity, "Prepared ticket");
                }
                Err(source) => {
                    error!(ticket_index = index, quantity, error = %source, "Failed to prepare ticket");
                    self.delete_codes(&prepared).await;
                    return Err(RegistrationError::Prepare {
                        index,
                        quantity,
                        source,
                    });
                }
            }
        }
        Ok(prepared)
    }

    async fn recheck_pricing(
        &self,
        request: &RegistrationRequest,
        event_id: Uuid,
        quote: &PriceQuote,
        prepared: &[NewTicket],
    ) -> Result<(), RegistrationError> {
        let current = self
            .pricing
            .resolve(event_id, request.ticket_quantity, request.food_option, request.payment_method)
            .await;
        let current = match current {
            Ok(current) => current,
            Err(e) => {
                self.delete_codes(prepared).await;
                return Err(e.into());
            }
        };
        if current.price_per_ticket != quote.price_per_ticket {
            warn!(
                %event_id,
                quoted = %quote.price_per_ticket,
                current = %current.price_per_ticket,
                "Pricing changed between quote and commit"
            );
            self.delete_codes(prepared).await;
            return Err(RegistrationError::PricingChanged {
                quoted: quote.price_per_ticket,
                current: current.price_per_ticket,
            });
        }
        Ok(())
    }

    async fn commit(&self, prepared: &[NewTicket]) -> Result<Vec<Ticket>, RegistrationError> {
        let mut created: Vec<Ticket> = Vec::with_capacity(prepared.len());
        for (i, ticket) in prepared.iter().enumerate() {
            match self.tickets.insert_ticket(ticket.clone()).await {
                Ok(row) => {
                    info!(ticket_index = i + 1, quantity = prepared.len(), "Created ticket record");
                    created.push(row);
                }
                Err(source) => {
                    error!(ticket_index = i + 1, error = %source, "Failed to create ticket record");
                    self.delete_rows(&created).await;
                    self.delete_codes(prepared).await;
                    return Err(RegistrationError::Commit { source });
                }
            }
        }
        Ok(created)
    }

    async fn delete_rows(&self, created: &[Ticket]) {
        for (i, ticket) in created.iter().enumerate() {
            match self.tickets.delete_ticket(ticket.id).await {
                Ok(()) => info!(ticket_index = i + 1, ticket_id = %ticket.id, "Rolled back ticket record"),
                Err(e) => error!(ticket_id = %ticket.id, error = %e, "Failed to roll back ticket record"),
            }
        }
    }

    async fn delete_codes(&self, prepared: &[NewTicket]) {
        for ticket in prepared {
            self.issuer.delete(&ticket.code).await;
        }
    }

    fn notify(&self, buyer: &Buyer, created: &[Ticket], quote: &PriceQuote) {
        let tickets = created
            .iter()
            .enumerate()
            .map(|(i, t)| IssuedTicket {
                ticket_number: i + 1,
                code: t.code.clone(),
                image_url: t.image_url.clone(),
            })
            .collect();
        self.notifications.dispatch(
            buyer.email.clone(),
            Notification::Registration {
                name: buyer.name.clone(),
                tickets,
                price_per_ticket: quote.price_per_ticket,
                total_price: quote.total_price,
            },
        );
    }
}

/// The bound every quantity is held to, whether it is being registered or only quoted.
pub fn check_quantity(quantity: i32, max_quantity: i32) -> Result<(), RegistrationError> {
    if quantity < 1 || quantity > max_quantity {
        return Err(RegistrationError::Validation(format!(
            "Ticket quantity must be between 1 and {max_quantity}"
        )));
    }
    Ok(())
}

/// Rejects malformed requests before anything is read or written.
fn validate_request(request: &RegistrationRequest, max_quantity: i32) -> Result<Buyer, RegistrationError> {
    check_quantity(request.ticket_quantity, max_quantity)?;

    let name = request.name.trim();
    if name.is_empty() {
        return Err(RegistrationError::Validation("Name cannot be empty".to_string()));
    }

    let email = request.email.trim();
    if !is_plausible_email(email) {
        return Err(RegistrationError::Validation("A valid email address is required".to_string()));
    }

    let phone = request.phone.trim();
    if phone.chars().filter(char::is_ascii_digit).count() < MIN_PHONE_DIGITS {
        return Err(RegistrationError::Validation(format!(
            "Phone number must have at least {MIN_PHONE_DIGITS} digits"
        )));
    }

    Ok(Buyer {
        name: name.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
    })
}

fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
