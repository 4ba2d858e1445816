//! Outbound notifications (registration email, check-in confirmation).
//!
//! Delivery is fire-and-forget: the dispatcher spawns each send and only logs the outcome.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info};

pub mod webhook;

pub use webhook::WebhookNotifier;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notification request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Notification rejected with status {0}")]
    Rejected(u16),

    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssuedTicket {
    pub ticket_number: usize,
    pub code: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    Registration {
        name: String,
        tickets: Vec<IssuedTicket>,
        price_per_ticket: Decimal,
        total_price: Decimal,
    },
    CheckInConfirmation {
        name: String,
        checked_in_at: DateTime<Utc>,
    },
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::Registration { .. } => "registration",
            Notification::CheckInConfirmation { .. } => "check_in_confirmation",
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, notification: &Notification) -> Result<(), NotificationError>;
}

/// Notifier used when no delivery channel is configured.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, recipient: &str, notification: &Notification) -> Result<(), NotificationError> {
        info!(recipient, kind = notification.kind(), "Notification delivery not configured, logging only");
        Ok(())
    }
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Sends in the background. Failures are logged and never reach the caller; the handle is only
    /// useful to tests that want to wait for delivery.
    pub fn dispatch(&self, recipient: String, notification: Notification) -> JoinHandle<()> {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            match notifier.send(&recipient, &notification).await {
                Ok(()) => info!(recipient = %recipient, kind = notification.kind(), "Notification sent"),
                Err(e) => error!(
                    recipient = %recipient,
                    kind = notification.kind(),
                    error = %e,
                    "Notification failed"
                ),
            }
        })
    }
}
