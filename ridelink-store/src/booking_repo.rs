use async_trait::async_trait;
use chrono::NaiveDate;
use ridelink_core::{BookingRepository, PaymentCompletion};
use ridelink_domain::{Booking, BookingError, PaymentStatus};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Postgres booking ledger. Capacity-sensitive writes lock the bus row
/// (`SELECT ... FOR UPDATE`) so the availability check and the write commit
/// as one unit per (bus, date); the lock ordering is always bus row first,
/// then booking row.
pub struct StoreBookingRepository {
    pool: PgPool,
}

impl StoreBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const BOOKING_COLUMNS: &str = "id, user_id, bus_id, travel_date, seats_booked, total_price_minor, \
     currency, passenger_name, passenger_email, passenger_phone, payment_status, \
     order_id, payment_id, payment_method, booking_reference, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: String,
    bus_id: Uuid,
    travel_date: NaiveDate,
    seats_booked: i32,
    total_price_minor: i32,
    currency: String,
    passenger_name: String,
    passenger_email: String,
    passenger_phone: String,
    payment_status: String,
    order_id: Option<String>,
    payment_id: Option<String>,
    payment_method: Option<String>,
    booking_reference: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl BookingRow {
    fn into_domain(self) -> Result<Booking, BookingError> {
        Ok(Booking {
            id: self.id,
            user_id: self.user_id,
            bus_id: self.bus_id,
            travel_date: self.travel_date,
            seats_booked: self.seats_booked,
            total_price_minor: self.total_price_minor,
            currency: self.currency,
            passenger_name: self.passenger_name,
            passenger_email: self.passenger_email,
            passenger_phone: self.passenger_phone,
            payment_status: PaymentStatus::parse(&self.payment_status)?,
            order_id: self.order_id,
            payment_id: self.payment_id,
            payment_method: self.payment_method,
            booking_reference: self.booking_reference,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn storage_err(e: sqlx::Error) -> BookingError {
    BookingError::Storage(e.to_string())
}

/// Lock the bus row for the duration of the transaction and return its
/// capacity. Serializes all capacity checks for that bus.
async fn lock_bus_capacity(
    tx: &mut Transaction<'_, Postgres>,
    bus_id: Uuid,
) -> Result<i32, BookingError> {
    sqlx::query_scalar::<_, i32>("SELECT total_seats FROM buses WHERE id = $1 FOR UPDATE")
        .bind(bus_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(storage_err)?
        .ok_or_else(|| BookingError::NotFound(format!("bus {}", bus_id)))
}

/// Completed-seat sum for (bus, date), optionally excluding one booking.
async fn completed_seats(
    tx: &mut Transaction<'_, Postgres>,
    bus_id: Uuid,
    travel_date: NaiveDate,
    exclude: Option<Uuid>,
) -> Result<i64, BookingError> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(seats_booked), 0) FROM bookings \
         WHERE bus_id = $1 AND travel_date = $2 AND payment_status = 'completed' \
           AND ($3::uuid IS NULL OR id <> $3)",
    )
    .bind(bus_id)
    .bind(travel_date)
    .bind(exclude)
    .fetch_one(&mut **tx)
    .await
    .map_err(storage_err)
}

fn check_capacity(total_seats: i32, sold: i64, requested: i32) -> Result<(), BookingError> {
    let available = (total_seats as i64 - sold) as i32;
    if requested > available {
        return Err(BookingError::CapacityExceeded {
            requested,
            available,
        });
    }
    Ok(())
}

#[async_trait]
impl BookingRepository for StoreBookingRepository {
    async fn seats_sold(&self, bus_id: Uuid, travel_date: NaiveDate) -> Result<i64, BookingError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(seats_booked), 0) FROM bookings \
             WHERE bus_id = $1 AND travel_date = $2 AND payment_status = 'completed'",
        )
        .bind(bus_id)
        .bind(travel_date)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_err)
    }

    async fn create_booking(&self, booking: &Booking) -> Result<(), BookingError> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        let total_seats = lock_bus_capacity(&mut tx, booking.bus_id).await?;
        let sold = completed_seats(&mut tx, booking.bus_id, booking.travel_date, None).await?;
        check_capacity(total_seats, sold, booking.seats_booked)?;

        sqlx::query(
            "INSERT INTO bookings (id, user_id, bus_id, travel_date, seats_booked, \
             total_price_minor, currency, passenger_name, passenger_email, passenger_phone, \
             payment_status, order_id, payment_id, payment_method, booking_reference, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
        )
        .bind(booking.id)
        .bind(&booking.user_id)
        .bind(booking.bus_id)
        .bind(booking.travel_date)
        .bind(booking.seats_booked)
        .bind(booking.total_price_minor)
        .bind(&booking.currency)
        .bind(&booking.passenger_name)
        .bind(&booking.passenger_email)
        .bind(&booking.passenger_phone)
        .bind(booking.payment_status.as_str())
        .bind(&booking.order_id)
        .bind(&booking.payment_id)
        .bind(&booking.payment_method)
        .bind(&booking.booking_reference)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(storage_err)?;

        tx.commit().await.map_err(storage_err)
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, BookingError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        row.map(BookingRow::into_domain).transpose()
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Booking>, BookingError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC",
            BOOKING_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        rows.into_iter().map(BookingRow::into_domain).collect()
    }

    async fn update_seats(&self, booking: &Booking) -> Result<(), BookingError> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        let total_seats = lock_bus_capacity(&mut tx, booking.bus_id).await?;
        let sold =
            completed_seats(&mut tx, booking.bus_id, booking.travel_date, Some(booking.id)).await?;
        check_capacity(total_seats, sold, booking.seats_booked)?;

        let result = sqlx::query(
            "UPDATE bookings SET seats_booked = $1, total_price_minor = $2, updated_at = NOW() \
             WHERE id = $3 AND payment_status = 'pending'",
        )
        .bind(booking.seats_booked)
        .bind(booking.total_price_minor)
        .bind(booking.id)
        .execute(&mut *tx)
        .await
        .map_err(storage_err)?;

        if result.rows_affected() == 0 {
            // The booking left the pending state between the caller's read
            // and this write.
            return Err(BookingError::InvalidState(
                "booking is no longer pending".to_string(),
            ));
        }

        tx.commit().await.map_err(storage_err)
    }

    async fn update_status(&self, id: Uuid, status: PaymentStatus) -> Result<(), BookingError> {
        // Every permitted transition starts from pending; the guard makes
        // the write a no-op if the state changed concurrently.
        let result = sqlx::query(
            "UPDATE bookings SET payment_status = $1, updated_at = NOW() \
             WHERE id = $2 AND payment_status = 'pending'",
        )
        .bind(status.as_str())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        if result.rows_affected() == 0 {
            return Err(BookingError::InvalidState(
                "booking is no longer pending".to_string(),
            ));
        }
        Ok(())
    }

    async fn set_payment_order(&self, id: Uuid, order_id: &str) -> Result<(), BookingError> {
        // `order_id IS NULL` makes the attach first-writer-wins under
        // concurrent initiates.
        let result = sqlx::query(
            "UPDATE bookings SET order_id = $1, updated_at = NOW() \
             WHERE id = $2 AND payment_status = 'pending' AND order_id IS NULL",
        )
        .bind(order_id)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        if result.rows_affected() == 0 {
            return Err(BookingError::InvalidState(
                "booking already has a payment order or is no longer pending".to_string(),
            ));
        }
        Ok(())
    }

    async fn complete_payment(
        &self,
        order_id: &str,
        payment_id: &str,
        payment_method: &str,
    ) -> Result<PaymentCompletion, BookingError> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        // Find the bus before taking any row lock, to keep the bus-first
        // lock ordering shared with create/update_seats.
        let target: Option<(Uuid, Uuid)> = sqlx::query_as(
            "SELECT id, bus_id FROM bookings WHERE order_id = $1",
        )
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_err)?;

        let (booking_id, bus_id) = target
            .ok_or_else(|| BookingError::NotFound(format!("payment order {}", order_id)))?;

        let total_seats = lock_bus_capacity(&mut tx, bus_id).await?;

        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = $1 FOR UPDATE",
            BOOKING_COLUMNS
        ))
        .bind(booking_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_err)?
        .ok_or_else(|| BookingError::NotFound(format!("payment order {}", order_id)))?;

        let booking = row.into_domain()?;
        match booking.payment_status {
            PaymentStatus::Completed => {
                tx.commit().await.map_err(storage_err)?;
                Ok(PaymentCompletion::AlreadyCompleted(booking))
            }
            PaymentStatus::Pending => {
                let sold =
                    completed_seats(&mut tx, bus_id, booking.travel_date, Some(booking.id)).await?;
                check_capacity(total_seats, sold, booking.seats_booked)?;

                sqlx::query(
                    "UPDATE bookings SET payment_status = 'completed', payment_id = $1, \
                     payment_method = $2, updated_at = NOW() WHERE id = $3",
                )
                .bind(payment_id)
                .bind(payment_method)
                .bind(booking.id)
                .execute(&mut *tx)
                .await
                .map_err(storage_err)?;

                tx.commit().await.map_err(storage_err)?;

                let mut completed = booking;
                completed.payment_status = PaymentStatus::Completed;
                completed.payment_id = Some(payment_id.to_string());
                completed.payment_method = Some(payment_method.to_string());
                Ok(PaymentCompletion::Completed(completed))
            }
            status => Err(BookingError::InvalidState(format!(
                "cannot complete payment for a {} booking",
                status.as_str()
            ))),
        }
    }

    async fn delete_booking(&self, id: Uuid) -> Result<(), BookingError> {
        let result = sqlx::query(
            "DELETE FROM bookings \
             WHERE id = $1 AND payment_status = 'pending' AND order_id IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        if result.rows_affected() == 0 {
            return Err(BookingError::InvalidState(
                "only pending bookings without a payment order can be deleted".to_string(),
            ));
        }
        Ok(())
    }
}
