use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A scheduled bus route. Reference data: created and updated by an
/// administrative process, read-only to the booking engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bus {
    pub id: Uuid,
    pub bus_name: String,
    pub bus_number: String,
    pub source: String,
    pub destination: String,
    pub total_seats: i32,
    /// Price per seat in minor currency units (e.g. paise).
    pub price_minor: i32,
    pub currency: String,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
    pub journey_duration: String,
}

impl Bus {
    /// Price for `seats` seats in minor units. `None` when the total does
    /// not fit in an i32.
    pub fn price_for(&self, seats: i32) -> Option<i32> {
        self.price_minor.checked_mul(seats)
    }
}
