use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Remaining seats for a bus on a travel date, derived from the sum of
/// completed bookings. `remaining` stays signed: a negative value means the
/// capacity invariant has been violated and must be surfaced, not clamped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatAvailability {
    pub bus_id: Uuid,
    pub travel_date: NaiveDate,
    pub total_seats: i32,
    pub seats_sold: i64,
    pub remaining: i32,
}

impl SeatAvailability {
    pub fn compute(bus_id: Uuid, travel_date: NaiveDate, total_seats: i32, seats_sold: i64) -> Self {
        let remaining = (total_seats as i64 - seats_sold) as i32;
        Self {
            bus_id,
            travel_date,
            total_seats,
            seats_sold,
            remaining,
        }
    }

    /// True when confirmed seats exceed capacity. Signals a consistency bug.
    pub fn is_oversold(&self) -> bool {
        self.remaining < 0
    }

    /// Whether a request for `seats` more seats fits.
    pub fn can_accommodate(&self, seats: i32) -> bool {
        seats <= self.remaining
    }
}
