use async_trait::async_trait;
use chrono::NaiveDate;
use ridelink_domain::{Booking, BookingError, Bus, PaymentStatus};
use uuid::Uuid;

/// Repository trait for bus catalog access. The catalog is read-only from
/// the engine's perspective.
#[async_trait]
pub trait BusRepository: Send + Sync {
    async fn get_bus(&self, id: Uuid) -> Result<Option<Bus>, BookingError>;

    /// Case-insensitive substring match on route endpoints. `None` matches
    /// everything, so `search_buses(None, None)` lists the whole catalog.
    async fn search_buses(
        &self,
        source: Option<&str>,
        destination: Option<&str>,
    ) -> Result<Vec<Bus>, BookingError>;
}

/// Outcome of applying a payment confirmation to the ledger.
#[derive(Debug)]
pub enum PaymentCompletion {
    /// The booking transitioned pending -> completed in this call.
    Completed(Booking),
    /// The booking was already completed; the replay changed nothing.
    AlreadyCompleted(Booking),
}

/// Repository trait for the booking ledger.
///
/// The capacity invariant lives here: `create_booking` and `update_seats`
/// must perform the availability check and the write as one indivisible unit
/// per (bus, date), so two concurrent requests observe a sequential order.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Sum of `seats_booked` over completed bookings for (bus, date).
    async fn seats_sold(&self, bus_id: Uuid, travel_date: NaiveDate) -> Result<i64, BookingError>;

    /// Insert a pending booking, failing with `CapacityExceeded` if the
    /// requested seats no longer fit at commit time.
    async fn create_booking(&self, booking: &Booking) -> Result<(), BookingError>;

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, BookingError>;

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Booking>, BookingError>;

    /// Persist a seat-count change (seats and recomputed price taken from
    /// `booking`), revalidating capacity against the *other* bookings of
    /// that bus and date in the same transaction.
    async fn update_seats(&self, booking: &Booking) -> Result<(), BookingError>;

    async fn update_status(&self, id: Uuid, status: PaymentStatus) -> Result<(), BookingError>;

    /// Store the external payment order handle on a pending booking that
    /// has none yet. `InvalidState` when an order is already attached or
    /// the booking left the pending state; the first attached order wins.
    async fn set_payment_order(&self, id: Uuid, order_id: &str) -> Result<(), BookingError>;

    /// Atomically flip the booking identified by `order_id` from pending to
    /// completed, recording the payment identifiers. Capacity is re-checked
    /// in the same unit: completion that would push the completed-seat sum
    /// past the bus capacity fails with `CapacityExceeded` and leaves the
    /// booking pending. Replays against an already-completed booking are
    /// reported, not re-applied; a failed or cancelled booking rejects the
    /// update with `InvalidState`.
    async fn complete_payment(
        &self,
        order_id: &str,
        payment_id: &str,
        payment_method: &str,
    ) -> Result<PaymentCompletion, BookingError>;

    /// Hard delete, only valid for a pending booking with no payment order.
    async fn delete_booking(&self, id: Uuid) -> Result<(), BookingError>;
}
