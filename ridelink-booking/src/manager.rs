use std::sync::Arc;

use chrono::NaiveDate;
use ridelink_core::{BookingRepository, BusRepository};
use ridelink_domain::{
    Booking, BookingError, Bus, PassengerDetails, PaymentStatus, SeatAvailability,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog hit with, when a travel date was given, its availability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusSearchResult {
    pub bus: Bus,
    pub availability: Option<SeatAvailability>,
}

/// Manages the booking lifecycle: creation, seat changes and cancellation,
/// gated by the payment state machine. The capacity invariant itself is
/// enforced by the repository's atomic operations; this layer validates
/// input, derives prices and shapes errors.
pub struct BookingManager {
    buses: Arc<dyn BusRepository>,
    bookings: Arc<dyn BookingRepository>,
}

impl BookingManager {
    pub fn new(buses: Arc<dyn BusRepository>, bookings: Arc<dyn BookingRepository>) -> Self {
        Self { buses, bookings }
    }

    /// Remaining seats for a bus on a date. A negative remainder means the
    /// capacity invariant was violated somewhere; it is logged and returned
    /// as-is so the inconsistency stays visible.
    pub async fn availability(
        &self,
        bus_id: Uuid,
        travel_date: NaiveDate,
    ) -> Result<SeatAvailability, BookingError> {
        let bus = self.require_bus(bus_id).await?;
        let sold = self.bookings.seats_sold(bus_id, travel_date).await?;
        let availability = SeatAvailability::compute(bus_id, travel_date, bus.total_seats, sold);

        if availability.is_oversold() {
            tracing::warn!(
                "Capacity invariant violated for bus {} on {}: {} seats sold, {} total",
                bus_id,
                travel_date,
                sold,
                bus.total_seats
            );
        }

        Ok(availability)
    }

    /// Search the catalog by route endpoints; with a date each result
    /// carries its remaining seats.
    pub async fn search(
        &self,
        source: Option<&str>,
        destination: Option<&str>,
        travel_date: Option<NaiveDate>,
    ) -> Result<Vec<BusSearchResult>, BookingError> {
        let buses = self.buses.search_buses(source, destination).await?;

        let mut results = Vec::with_capacity(buses.len());
        for bus in buses {
            let availability = match travel_date {
                Some(date) => Some(self.availability(bus.id, date).await?),
                None => None,
            };
            results.push(BusSearchResult { bus, availability });
        }
        Ok(results)
    }

    /// Create a pending booking. The repository performs the availability
    /// check and the insert as one unit, so concurrent requests for the
    /// same (bus, date) serialize on it.
    pub async fn create(
        &self,
        user_id: &str,
        bus_id: Uuid,
        travel_date: NaiveDate,
        seats: i32,
        passenger: PassengerDetails,
    ) -> Result<Booking, BookingError> {
        let bus = self.require_bus(bus_id).await?;
        let booking = Booking::new(user_id, &bus, travel_date, seats, passenger)?;
        self.bookings.create_booking(&booking).await?;

        tracing::info!(
            "Booking {} created: {} seats on bus {} for {}",
            booking.booking_reference,
            seats,
            bus.bus_number,
            travel_date
        );
        Ok(booking)
    }

    /// Change the seat count of a pending booking, recomputing the price.
    /// Capacity is revalidated against the other bookings of that bus/date.
    pub async fn modify(
        &self,
        booking_id: Uuid,
        user_id: &str,
        new_seats: i32,
    ) -> Result<Booking, BookingError> {
        let mut booking = self.require_booking(booking_id, user_id).await?;
        let bus = self.require_bus(booking.bus_id).await?;

        booking.change_seats(&bus, new_seats)?;
        self.bookings.update_seats(&booking).await?;

        tracing::info!(
            "Booking {} modified to {} seats, total {}",
            booking.booking_reference,
            new_seats,
            booking.total_price_minor
        );
        Ok(booking)
    }

    /// Cancel a pending booking. Completed bookings need a refund-aware
    /// flow and are rejected here; re-cancelling is rejected too rather
    /// than silently succeeding.
    pub async fn cancel(&self, booking_id: Uuid, user_id: &str) -> Result<Booking, BookingError> {
        let mut booking = self.require_booking(booking_id, user_id).await?;
        booking.transition(PaymentStatus::Cancelled)?;
        self.bookings
            .update_status(booking.id, PaymentStatus::Cancelled)
            .await?;

        tracing::info!("Booking {} cancelled", booking.booking_reference);
        Ok(booking)
    }

    /// Hard-delete a pending booking that never entered payment. Anything
    /// with an order attached is kept for the audit trail.
    pub async fn delete(&self, booking_id: Uuid, user_id: &str) -> Result<(), BookingError> {
        let booking = self.require_booking(booking_id, user_id).await?;

        if booking.payment_status != PaymentStatus::Pending {
            return Err(BookingError::InvalidState(format!(
                "cannot delete a {} booking",
                booking.payment_status.as_str()
            )));
        }
        if booking.payment_attempted() {
            return Err(BookingError::InvalidState(
                "cannot delete a booking with a payment order; cancel it instead".to_string(),
            ));
        }

        self.bookings.delete_booking(booking.id).await
    }

    pub async fn get_bus(&self, bus_id: Uuid) -> Result<Bus, BookingError> {
        self.require_bus(bus_id).await
    }

    pub async fn get(&self, booking_id: Uuid, user_id: &str) -> Result<Booking, BookingError> {
        self.require_booking(booking_id, user_id).await
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Booking>, BookingError> {
        self.bookings.list_for_user(user_id).await
    }

    async fn require_bus(&self, bus_id: Uuid) -> Result<Bus, BookingError> {
        self.buses
            .get_bus(bus_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("bus {}", bus_id)))
    }

    /// Owner-scoped booking lookup. A booking belonging to another user is
    /// indistinguishable from a missing one.
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
