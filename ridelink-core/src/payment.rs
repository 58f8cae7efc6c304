use async_trait::async_trait;
use ridelink_domain::BookingError;
use serde::{Deserialize, Serialize};

/// External gateway's handle for an intent to charge a specific amount,
/// created before payment completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub id: String,
    pub amount_minor: i32,
    pub currency: String,
}

/// Adapter for the external payment processor. Constructed explicitly and
/// passed in, so tests can substitute a fake.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a charge order with the provider for `amount_minor` units of
    /// `currency`. `receipt` is an opaque merchant reference (we pass the
    /// booking reference).
    async fn create_order(
        &self,
        amount_minor: i32,
        currency: &str,
        receipt: &str,
    ) -> Result<PaymentOrder, BookingError>;

    /// Verify the completion callback signature over (order_id, payment_id)
    /// using the gateway's shared-secret scheme. Purely local; no I/O.
    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool;

    /// Name recorded as `payment_method` on completed bookings.
    fn method_name(&self) -> &str;
}
