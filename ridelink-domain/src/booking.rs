use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bus::Bus;
use crate::error::BookingError;

/// Payment lifecycle of a booking. `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Result<Self, BookingError> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            "cancelled" => Ok(PaymentStatus::Cancelled),
            other => Err(BookingError::Storage(format!(
                "unknown payment status '{}'",
                other
            ))),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }

    /// Whether the transition `self -> to` is allowed. Only
    /// `pending -> completed | failed | cancelled` exist; terminal states
    /// accept nothing.
    pub fn can_transition(&self, to: PaymentStatus) -> bool {
        matches!(self, PaymentStatus::Pending) && to != PaymentStatus::Pending
    }
}

/// Contact details for the travelling passenger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassengerDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl PassengerDetails {
    pub fn validate(&self) -> Result<(), BookingError> {
        if self.name.trim().is_empty() {
            return Err(BookingError::Validation(
                "passenger name must not be empty".to_string(),
            ));
        }
        if !self.email.contains('@') {
            return Err(BookingError::Validation(format!(
                "invalid passenger email '{}'",
                self.email
            )));
        }
        if self.phone.trim().is_empty() {
            return Err(BookingError::Validation(
                "passenger phone must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// A seat reservation for a bus on a travel date, carrying its payment
/// lifecycle state and the external gateway identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: String,
    pub bus_id: Uuid,
    pub travel_date: NaiveDate,
    pub seats_booked: i32,
    pub total_price_minor: i32,
    pub currency: String,
    pub passenger_name: String,
    pub passenger_email: String,
    pub passenger_phone: String,
    pub payment_status: PaymentStatus,
    pub order_id: Option<String>,
    pub payment_id: Option<String>,
    pub payment_method: Option<String>,
    /// Human-shareable code, assigned exactly once at creation.
    pub booking_reference: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Build a new pending booking. The total price is derived from the bus
    /// price at creation time; the reference is generated here and never
    /// changes afterwards.
    pub fn new(
        user_id: &str,
        bus: &Bus,
        travel_date: NaiveDate,
        seats: i32,
        passenger: PassengerDetails,
    ) -> Result<Self, BookingError> {
        validate_seat_count(bus, seats)?;
        passenger.validate()?;
        let total_price_minor = priced(bus, seats)?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            bus_id: bus.id,
            travel_date,
            seats_booked: seats,
            total_price_minor,
            currency: bus.currency.clone(),
            passenger_name: passenger.name,
            passenger_email: passenger.email,
            passenger_phone: passenger.phone,
            payment_status: PaymentStatus::Pending,
            order_id: None,
            payment_id: None,
            payment_method: None,
            booking_reference: generate_reference(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Validated payment-state transition. Disallowed transitions are
    /// rejected by construction rather than by caller discipline.
    pub fn transition(&mut self, to: PaymentStatus) -> Result<(), BookingError> {
        if !self.payment_status.can_transition(to) {
            return Err(BookingError::InvalidTransition {
                from: self.payment_status.as_str().to_string(),
                to: to.as_str().to_string(),
            });
        }
        self.payment_status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Change the seat count, recomputing the total price from the bus price.
    /// Only permitted while payment is pending; capacity revalidation is the
    /// repository's job.
    pub fn change_seats(&mut self, bus: &Bus, new_seats: i32) -> Result<(), BookingError> {
        if self.payment_status != PaymentStatus::Pending {
            return Err(BookingError::InvalidState(format!(
                "cannot modify a {} booking",
                self.payment_status.as_str()
            )));
        }
        validate_seat_count(bus, new_seats)?;
        let total_price_minor = priced(bus, new_seats)?;
        self.seats_booked = new_seats;
        self.total_price_minor = total_price_minor;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Whether payment has ever been attempted for this booking.
    pub fn payment_attempted(&self) -> bool {
        self.order_id.is_some()
    }
}

/// A request can never ask for more seats than the bus has, so the bound is
/// checked before any pricing arithmetic runs.
fn validate_seat_count(bus: &Bus, seats: i32) -> Result<(), BookingError> {
    if seats < 1 {
        return Err(BookingError::Validation(format!(
            "seats must be at least 1, got {}",
            seats
        )));
    }
    if seats > bus.total_seats {
        return Err(BookingError::Validation(format!(
            "seats must not exceed bus capacity of {}, got {}",
            bus.total_seats, seats
        )));
    }
    Ok(())
}

fn priced(bus: &Bus, seats: i32) -> Result<i32, BookingError> {
    bus.price_for(seats).ok_or_else(|| {
        BookingError::Validation(format!("total price for {} seats overflows", seats))
    })
}

const REFERENCE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const REFERENCE_LEN: usize = 10;

/// 10-character uppercase alphanumeric booking reference.
pub fn generate_reference() -> String {
    let mut rng = rand::thread_rng();
    (0..REFERENCE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..REFERENCE_CHARSET.len());
            REFERENCE_CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn test_bus() -> Bus {
        Bus {
            id: Uuid::new_v4(),
            bus_name: "Test Express".to_string(),
            bus_number: "TEST-001".to_string(),
            source: "Delhi".to_string(),
            destination: "Mumbai".to_string(),
            total_seats: 40,
            price_minor: 120000,
            currency: "INR".to_string(),
            departure_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            arrival_time: NaiveTime::from_hms_opt(21, 30, 0).unwrap(),
            journey_duration: "12 hours 30 minutes".to_string(),
        }
    }

    fn test_passenger() -> PassengerDetails {
        PassengerDetails {
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            phone: "+91-9876543210".to_string(),
        }
    }

    #[test]
    fn test_new_booking_prices_and_reference() {
        let bus = test_bus();
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let booking = Booking::new("user-1", &bus, date, 2, test_passenger()).unwrap();

        assert_eq!(booking.payment_status, PaymentStatus::Pending);
        assert_eq!(booking.total_price_minor, 240000);
        assert_eq!(booking.booking_reference.len(), 10);
        assert!(booking
            .booking_reference
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        assert!(booking.order_id.is_none());
    }

    #[test]
    fn test_zero_seats_rejected() {
        let bus = test_bus();
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let result = Booking::new("user-1", &bus, date, 0, test_passenger());
        assert!(matches!(result, Err(BookingError::Validation(_))));
    }

    #[test]
    fn test_absurd_seat_count_rejected_before_pricing() {
        let bus = test_bus();
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        // Large enough that price_minor * seats would overflow i32; must
        // come back as a validation error, not an arithmetic panic.
        let result = Booking::new("user-1", &bus, date, 20_000_000, test_passenger());
        assert!(matches!(result, Err(BookingError::Validation(_))));
    }

    #[test]
    fn test_seats_beyond_capacity_rejected() {
        let bus = test_bus();
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let result = Booking::new("user-1", &bus, date, 41, test_passenger());
        assert!(matches!(result, Err(BookingError::Validation(_))));

        let mut booking = Booking::new("user-1", &bus, date, 2, test_passenger()).unwrap();
        let err = booking.change_seats(&bus, 20_000_000).unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
        assert_eq!(booking.seats_booked, 2);
        assert_eq!(booking.total_price_minor, 240000);
    }

    #[test]
    fn test_bad_email_rejected() {
        let bus = test_bus();
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let mut passenger = test_passenger();
        passenger.email = "not-an-email".to_string();
        let result = Booking::new("user-1", &bus, date, 1, passenger);
        assert!(matches!(result, Err(BookingError::Validation(_))));
    }

    #[test]
    fn test_transition_table() {
        assert!(PaymentStatus::Pending.can_transition(PaymentStatus::Completed));
        assert!(PaymentStatus::Pending.can_transition(PaymentStatus::Failed));
        assert!(PaymentStatus::Pending.can_transition(PaymentStatus::Cancelled));

        for terminal in [
            PaymentStatus::Completed,
            PaymentStatus::Failed,
            PaymentStatus::Cancelled,
        ] {
            for to in [
                PaymentStatus::Pending,
                PaymentStatus::Completed,
                PaymentStatus::Failed,
                PaymentStatus::Cancelled,
            ] {
                assert!(!terminal.can_transition(to));
            }
        }
    }

    #[test]
    fn test_transition_rejects_terminal() {
        let bus = test_bus();
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let mut booking = Booking::new("user-1", &bus, date, 2, test_passenger()).unwrap();

        booking.transition(PaymentStatus::Completed).unwrap();
        let err = booking.transition(PaymentStatus::Cancelled).unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition { .. }));
        assert_eq!(booking.payment_status, PaymentStatus::Completed);
    }

    #[test]
    fn test_change_seats_recomputes_price() {
        let bus = test_bus();
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let mut booking = Booking::new("user-1", &bus, date, 1, test_passenger()).unwrap();

        booking.change_seats(&bus, 5).unwrap();
        assert_eq!(booking.total_price_minor, 600000);
    }

    #[test]
    fn test_change_seats_blocked_after_completion() {
        let bus = test_bus();
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let mut booking = Booking::new("user-1", &bus, date, 2, test_passenger()).unwrap();
        booking.transition(PaymentStatus::Completed).unwrap();

        let err = booking.change_seats(&bus, 3).unwrap_err();
        assert!(matches!(err, BookingError::InvalidState(_)));
        assert_eq!(booking.seats_booked, 2);
        assert_eq!(booking.total_price_minor, 240000);
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Completed,
            PaymentStatus::Failed,
            PaymentStatus::Cancelled,
        ] {
            assert_eq!(PaymentStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(PaymentStatus::parse("refunded").is_err());
    }
}
