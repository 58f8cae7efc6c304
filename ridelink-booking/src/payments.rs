use std::sync::Arc;

use ridelink_core::{
    BookingRepository, NotificationQueue, PaymentCompletion, PaymentGateway, PaymentOrder,
};
use ridelink_domain::{Booking, BookingError, PaymentStatus};
use uuid::Uuid;

/// Result of applying a verified gateway callback.
#[derive(Debug)]
pub enum ConfirmOutcome {
    /// Booking moved to completed; exactly one notification was enqueued.
    Confirmed(Booking),
    /// Replay of an already-applied confirmation; nothing changed and no
    /// second notification was sent.
    AlreadyConfirmed(Booking),
}

impl ConfirmOutcome {
    pub fn booking(&self) -> &Booking {
        match self {
            ConfirmOutcome::Confirmed(b) | ConfirmOutcome::AlreadyConfirmed(b) => b,
        }
    }
}

/// Bridges the booking ledger to the external payment processor: creates
/// charge orders and consumes signed completion callbacks.
pub struct PaymentOrchestrator {
    gateway: Arc<dyn PaymentGateway>,
    bookings: Arc<dyn BookingRepository>,
    notifications: NotificationQueue,
}

impl PaymentOrchestrator {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        bookings: Arc<dyn BookingRepository>,
        notifications: NotificationQueue,
    ) -> Self {
        Self {
            gateway,
            bookings,
            notifications,
        }
    }

    /// Obtain a charge order for a pending booking. Retrying for the same
    /// booking reuses the stored order instead of creating a duplicate with
    /// the gateway.
    pub async fn initiate(
        &self,
        booking_id: Uuid,
        user_id: &str,
    ) -> Result<PaymentOrder, BookingError> {
        let booking = self.require_booking(booking_id, user_id).await?;

        match booking.payment_status {
            PaymentStatus::Pending => {}
            PaymentStatus::Completed => {
                return Err(BookingError::InvalidState(
                    "booking is already paid".to_string(),
                ))
            }
            status => {
                return Err(BookingError::InvalidState(format!(
                    "cannot pay for a {} booking",
                    status.as_str()
                )))
            }
        }

        if let Some(order_id) = &booking.order_id {
            return Ok(PaymentOrder {
                id: order_id.clone(),
                amount_minor: booking.total_price_minor,
                currency: booking.currency.clone(),
            });
        }

        let order = self
            .gateway
            .create_order(
                booking.total_price_minor,
                &booking.currency,
                &booking.booking_reference,
            )
            .await?;

        match self.bookings.set_payment_order(booking.id, &order.id).await {
            Ok(()) => {
                tracing::info!(
                    "Payment order {} created for booking {}",
                    order.id,
                    booking.booking_reference
                );
                Ok(order)
            }
            // A concurrent initiate attached an order between our read and
            // this write; the first attached order wins and ours is
            // discarded.
            Err(BookingError::InvalidState(_)) => {
                let current = self.require_booking(booking_id, user_id).await?;
                match (current.payment_status, &current.order_id) {
                    (PaymentStatus::Pending, Some(existing)) => {
                        tracing::info!(
                            "Reusing payment order {} attached concurrently for booking {}",
                            existing,
                            current.booking_reference
                        );
                        Ok(PaymentOrder {
                            id: existing.clone(),
                            amount_minor: current.total_price_minor,
                            currency: current.currency.clone(),
                        })
                    }
                    (status, _) => Err(BookingError::InvalidState(format!(
                        "cannot pay for a {} booking",
                        status.as_str()
                    ))),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Consume a gateway completion callback. The signature is verified
    /// before anything is looked up or written; an unverified callback can
    /// never mutate booking state. Replays of an applied confirmation are
    /// safe no-ops.
    pub async fn confirm(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<ConfirmOutcome, BookingError> {
        if !self.gateway.verify_signature(order_id, payment_id, signature) {
            tracing::warn!("Rejected payment callback for order {}: bad signature", order_id);
            return Err(BookingError::PaymentVerificationFailed);
        }

        let completion = self
            .bookings
            .complete_payment(order_id, payment_id, self.gateway.method_name())
            .await?;

        match completion {
            PaymentCompletion::Completed(booking) => {
                tracing::info!(
                    "Booking {} confirmed via payment {}",
                    booking.booking_reference,
                    payment_id
                );
                self.notifications.enqueue(booking.id);
                Ok(ConfirmOutcome::Confirmed(booking))
            }
            PaymentCompletion::AlreadyCompleted(booking) => {
                tracing::info!(
                    "Duplicate confirmation for booking {} ignored",
                    booking.booking_reference
                );
                Ok(ConfirmOutcome::AlreadyConfirmed(booking))
            }
        }
    }

    /// Record a failed checkout reported by the owner. Only a pending
    /// booking can move to failed; the transition table rejects the rest.
    pub async fn mark_failed(
        &self,
        booking_id: Uuid,
        user_id: &str,
    ) -> Result<Booking, BookingError> {
        let mut booking = self.require_booking(booking_id, user_id).await?;
        booking.transition(PaymentStatus::Failed)?;
        self.bookings
            .update_status(booking.id, PaymentStatus::Failed)
            .await?;

        tracing::info!("Booking {} marked as failed", booking.booking_reference);
        Ok(booking)
    }

    async fn require_booking(
        &self,
        booking_id: Uuid,
        user_id: &str,
    ) -> Result<Booking, BookingError> {
        let booking = self
            .bookings
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("booking {}", booking_id)))?;

        if booking.user_id != user_id {
            return Err(BookingError::NotFound(format!("booking {}", booking_id)));
        }
        Ok(booking)
    }
}
