use async_trait::async_trait;
use ridelink_core::{EmailMessage, Mailer};
use ridelink_domain::BookingError;
use serde_json::json;
use tracing::info;

/// Posts confirmation messages to an HTTP mail relay.
pub struct RelayMailer {
    relay_url: String,
    from_email: String,
    client: reqwest::Client,
}

impl RelayMailer {
    pub fn new(relay_url: String, from_email: String) -> Self {
        Self {
            relay_url,
            from_email,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Mailer for RelayMailer {
    async fn send(&self, message: &EmailMessage) -> Result<String, BookingError> {
        let body = json!({
            "from": self.from_email,
            "to": message.to,
            "subject": message.subject,
            "body": message.body,
        });

        let response = self
            .client
            .post(&self.relay_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| BookingError::Notification(format!("relay request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BookingError::Notification(format!(
                "mail relay returned {}",
                status
            )));
        }

        Ok(format!("confirmation email sent to {}", message.to))
    }
}

/// Fallback used when no relay is configured; logs the message instead of
/// delivering it.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<String, BookingError> {
        info!(to = %message.to, subject = %message.subject, "no mail relay configured, logging message");
        Ok(format!("confirmation email logged for {}", message.to))
    }
}
