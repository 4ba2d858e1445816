use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{Notification, NotificationError, Notifier};

/// Posts notifications as JSON to a mail relay, which renders and delivers them.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    recipient: &'a str,
    #[serde(flatten)]
    notification: &'a Notification,
}

impl WebhookNotifier {
    /// A relay that does not answer within `timeout` counts as a failed delivery.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotificationError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, recipient: &str, notification: &Notification) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload {
                recipient,
                notification,
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(NotificationError::Rejected(response.status().as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_payload_shape() {
        let notification = Notification::CheckInConfirmation {
            name: "Ada".to_string(),
            checked_in_at: Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap(),
        };
        let payload = serde_json::to_value(WebhookPayload {
            recipient: "ada@example.com",
            notification: &notification,
        })
        .unwrap();
        assert_eq!(payload["recipient"], "ada@example.com");
        assert_eq!(payload["kind"], "check_in_confirmation");
        assert_eq!(payload["name"], "Ada");
    }

    #[tokio::test]
    async fn test_unresponsive_relay_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accepts connections and never answers.
        let relay = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let notifier = WebhookNotifier::new(format!("http://{addr}/notify"), Duration::from_millis(200)).unwrap();
        let notification = Notification::CheckInConfirmation {
            name: "Ada".to_string(),
            checked_in_at: Utc::now(),
        };
        let result = tokio::time::timeout(Duration::from_secs(5), notifier.send("ada@example.com", &notification))
            .await
            .expect("send should give up on its own");
        assert!(matches!(result, Err(NotificationError::Request(_))));
        relay.abort();
    }
}
