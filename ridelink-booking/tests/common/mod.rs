use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use ridelink_core::{
    BookingRepository, BusRepository, PaymentCompletion, PaymentGateway, PaymentOrder,
};
use ridelink_domain::{Booking, BookingError, Bus, PassengerDetails, PaymentStatus};
use uuid::Uuid;

/// In-memory store backing the lifecycle tests. A single mutex over the
/// whole ledger gives the same serialization the Postgres implementation
/// gets from its bus-row lock.
pub struct MemStore {
    inner: Mutex<MemInner>,
}

struct MemInner {
    buses: HashMap<Uuid, Bus>,
    bookings: HashMap<Uuid, Booking>,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemInner {
                buses: HashMap::new(),
                bookings: HashMap::new(),
            }),
        }
    }

    pub fn add_bus(&self, bus: Bus) {
        self.inner.lock().unwrap().buses.insert(bus.id, bus);
    }

    /// Seed a booking directly, bypassing the capacity check. Used to set
    /// up pre-existing completed bookings.
    pub fn seed_booking(&self, booking: Booking) {
        self.inner
            .lock()
            .unwrap()
            .bookings
            .insert(booking.id, booking);
    }

    pub fn booking_count(&self) -> usize {
        self.inner.lock().unwrap().bookings.len()
    }

    fn completed_seats(inner: &MemInner, bus_id: Uuid, date: NaiveDate, exclude: Option<Uuid>) -> i64 {
        inner
            .bookings
            .values()
            .filter(|b| {
                b.bus_id == bus_id
                    && b.travel_date == date
                    && b.payment_status == PaymentStatus::Completed
                    && Some(b.id) != exclude
            })
            .map(|b| b.seats_booked as i64)
            .sum()
    }
}

#[async_trait]
impl BusRepository for MemStore {
    async fn get_bus(&self, id: Uuid) -> Result<Option<Bus>, BookingError> {
        Ok(self.inner.lock().unwrap().buses.get(&id).cloned())
    }

    async fn search_buses(
        &self,
        source: Option<&str>,
        destination: Option<&str>,
    ) -> Result<Vec<Bus>, BookingError> {
        let inner = self.inner.lock().unwrap();
        let mut buses: Vec<Bus> = inner
            .buses
            .values()
            .filter(|b| {
                source.map_or(true, |s| b.source.to_lowercase().contains(&s.to_lowercase()))
                    && destination.map_or(true, |d| {
                        b.destination.to_lowercase().contains(&d.to_lowercase())
                    })
            })
            .cloned()
            .collect();
        buses.sort_by(|a, b| a.bus_number.cmp(&b.bus_number));
        Ok(buses)
    }
}

#[async_trait]
impl BookingRepository for MemStore {
    async fn seats_sold(&self, bus_id: Uuid, travel_date: NaiveDate) -> Result<i64, BookingError> {
        let inner = self.inner.lock().unwrap();
        Ok(MemStore::completed_seats(&inner, bus_id, travel_date, None))
    }

    async fn create_booking(&self, booking: &Booking) -> Result<(), BookingError> {
        let mut inner = self.inner.lock().unwrap();
        let bus = inner
            .buses
            .get(&booking.bus_id)
            .ok_or_else(|| BookingError::NotFound(format!("bus {}", booking.bus_id)))?;

        let sold = MemStore::completed_seats(&inner, booking.bus_id, booking.travel_date, None);
        let available = (bus.total_seats as i64 - sold) as i32;
        if booking.seats_booked > available {
            return Err(BookingError::CapacityExceeded {
                requested: booking.seats_booked,
                available,
            });
        }

        inner.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, BookingError> {
        Ok(self.inner.lock().unwrap().bookings.get(&id).cloned())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Booking>, BookingError> {
        let inner = self.inner.lock().unwrap();
        let mut bookings: Vec<Booking> = inner
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn update_seats(&self, booking: &Booking) -> Result<(), BookingError> {
        let mut inner = self.inner.lock().unwrap();
        let bus = inner
            .buses
            .get(&booking.bus_id)
            .ok_or_else(|| BookingError::NotFound(format!("bus {}", booking.bus_id)))?;

        let sold =
            MemStore::completed_seats(&inner, booking.bus_id, booking.travel_date, Some(booking.id));
        let available = (bus.total_seats as i64 - sold) as i32;
        if booking.seats_booked > available {
            return Err(BookingError::CapacityExceeded {
                requested: booking.seats_booked,
                available,
            });
        }

        let stored = inner
            .bookings
            .get_mut(&booking.id)
            .ok_or_else(|| BookingError::NotFound(format!("booking {}", booking.id)))?;
        stored.seats_booked = booking.seats_booked;
        stored.total_price_minor = booking.total_price_minor;
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn update_status(&self, id: Uuid, status: PaymentStatus) -> Result<(), BookingError> {
        let mut inner = self.inner.lock().unwrap();
        let stored = inner
            .bookings
            .get_mut(&id)
            .ok_or_else(|| BookingError::NotFound(format!("booking {}", id)))?;
        stored.payment_status = status;
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn set_payment_order(&self, id: Uuid, order_id: &str) -> Result<(), BookingError> {
        let mut inner = self.inner.lock().unwrap();
        let stored = inner
            .bookings
            .get_mut(&id)
            .ok_or_else(|| BookingError::NotFound(format!("booking {}", id)))?;
        if stored.payment_status != PaymentStatus::Pending || stored.order_id.is_some() {
            return Err(BookingError::InvalidState(
                "booking already has a payment order or is no longer pending".to_string(),
            ));
        }
        stored.order_id = Some(order_id.to_string());
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn complete_payment(
        &self,
        order_id: &str,
        payment_id: &str,
        payment_method: &str,
    ) -> Result<PaymentCompletion, BookingError> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner
            .bookings
            .values()
            .find(|b| b.order_id.as_deref() == Some(order_id))
            .map(|b| b.id)
            .ok_or_else(|| BookingError::NotFound(format!("payment order {}", order_id)))?;

        let booking = inner.bookings.get(&id).cloned().unwrap();
        match booking.payment_status {
            PaymentStatus::Completed => Ok(PaymentCompletion::AlreadyCompleted(booking)),
            PaymentStatus::Pending => {
                let bus_seats = inner
                    .buses
                    .get(&booking.bus_id)
                    .map(|b| b.total_seats)
                    .ok_or_else(|| BookingError::NotFound(format!("bus {}", booking.bus_id)))?;
                let sold =
                    MemStore::completed_seats(&inner, booking.bus_id, booking.travel_date, Some(id));
                let available = (bus_seats as i64 - sold) as i32;
                if booking.seats_booked > available {
                    return Err(BookingError::CapacityExceeded {
                        requested: booking.seats_booked,
                        available,
                    });
                }

                let stored = inner.bookings.get_mut(&id).unwrap();
                stored.payment_status = PaymentStatus::Completed;
                stored.payment_id = Some(payment_id.to_string());
                stored.payment_method = Some(payment_method.to_string());
                stored.updated_at = Utc::now();
                Ok(PaymentCompletion::Completed(stored.clone()))
            }
            status => Err(BookingError::InvalidState(format!(
                "cannot complete payment for a {} booking",
                status.as_str()
            ))),
        }
    }

    async fn delete_booking(&self, id: Uuid) -> Result<(), BookingError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .bookings
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| BookingError::NotFound(format!("booking {}", id)))
    }
}

/// Fake gateway: deterministic signatures, counted order creation.
pub struct FakeGateway {
    orders_created: AtomicUsize,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            orders_created: AtomicUsize::new(0),
        }
    }

    pub fn orders_created(&self) -> usize {
        self.orders_created.load(Ordering::SeqCst)
    }

    pub fn sign(order_id: &str, payment_id: &str) -> String {
        format!("sig:{}:{}", order_id, payment_id)
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_order(
        &self,
        amount_minor: i32,
        currency: &str,
        receipt: &str,
    ) -> Result<PaymentOrder, BookingError> {
        let n = self.orders_created.fetch_add(1, Ordering::SeqCst);
        Ok(PaymentOrder {
            id: format!("order_{}_{}", receipt, n),
            amount_minor,
            currency: currency.to_string(),
        })
    }

    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        signature == FakeGateway::sign(order_id, payment_id)
    }

    fn method_name(&self) -> &str {
        "FakePay"
    }
}

pub fn test_bus(total_seats: i32, price_minor: i32) -> Bus {
    Bus {
        id: Uuid::new_v4(),
        bus_name: "Test Express".to_string(),
        bus_number: "TEST-001".to_string(),
        source: "Delhi".to_string(),
        destination: "Mumbai".to_string(),
        total_seats,
        price_minor,
        currency: "INR".to_string(),
        departure_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        arrival_time: NaiveTime::from_hms_opt(21, 30, 0).unwrap(),
        journey_duration: "12 hours 30 minutes".to_string(),
    }
}

pub fn test_passenger() -> PassengerDetails {
    PassengerDetails {
        name: "Test User".to_string(),
        email: "test@example.com".to_string(),
        phone: "+91-9876543210".to_string(),
    }
}

pub fn travel_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
}
