use async_trait::async_trait;
use ridelink_domain::BookingError;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Message queued for out-of-band confirmation delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingNotification {
    pub booking_id: Uuid,
}

/// Handle the payment bridge writes confirmations to. Enqueueing is
/// fire-and-forget: a full or closed channel is logged and dropped, never
/// surfaced to the confirmation path.
#[derive(Clone)]
pub struct NotificationQueue {
    tx: mpsc::Sender<BookingNotification>,
}

impl NotificationQueue {
    pub fn new(tx: mpsc::Sender<BookingNotification>) -> Self {
        Self { tx }
    }

    /// Bounded channel plus the receiver for the worker task.
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<BookingNotification>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    pub fn enqueue(&self, booking_id: Uuid) {
        let notification = BookingNotification { booking_id };
        if let Err(e) = self.tx.try_send(notification) {
            tracing::warn!("Dropping confirmation notification for booking {}: {}", booking_id, e);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivery backend for confirmation messages. Implementations report the
/// outcome as a diagnostic string; the worker only logs it.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<String, BookingError>;
}
