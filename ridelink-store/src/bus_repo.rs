use async_trait::async_trait;
use ridelink_core::BusRepository;
use ridelink_domain::{BookingError, Bus};
use sqlx::PgPool;
use uuid::Uuid;

pub struct StoreBusRepository {
    pool: PgPool,
}

impl StoreBusRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BusRow {
    id: Uuid,
    bus_name: String,
    bus_number: String,
    source: String,
    destination: String,
    total_seats: i32,
    price_minor: i32,
    currency: String,
    departure_time: chrono::NaiveTime,
    arrival_time: chrono::NaiveTime,
    journey_duration: String,
}

impl From<BusRow> for Bus {
    fn from(row: BusRow) -> Self {
        Bus {
            id: row.id,
            bus_name: row.bus_name,
            bus_number: row.bus_number,
            source: row.source,
            destination: row.destination,
            total_seats: row.total_seats,
            price_minor: row.price_minor,
            currency: row.currency,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            journey_duration: row.journey_duration,
        }
    }
}

const BUS_COLUMNS: &str = "id, bus_name, bus_number, source, destination, total_seats, \
     price_minor, currency, departure_time, arrival_time, journey_duration";

#[async_trait]
impl BusRepository for StoreBusRepository {
    async fn get_bus(&self, id: Uuid) -> Result<Option<Bus>, BookingError> {
        let row = sqlx::query_as::<_, BusRow>(&format!(
            "SELECT {} FROM buses WHERE id = $1",
            BUS_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BookingError::Storage(e.to_string()))?;

        Ok(row.map(Bus::from))
    }

    async fn search_buses(
        &self,
        source: Option<&str>,
        destination: Option<&str>,
    ) -> Result<Vec<Bus>, BookingError> {
        let rows = sqlx::query_as::<_, BusRow>(&format!(
            "SELECT {} FROM buses \
             WHERE ($1::text IS NULL OR source ILIKE '%' || $1 || '%') \
               AND ($2::text IS NULL OR destination ILIKE '%' || $2 || '%') \
             ORDER BY departure_time, bus_number",
            BUS_COLUMNS
        ))
        .bind(source)
        .bind(destination)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BookingError::Storage(e.to_string()))?;

        Ok(rows.into_iter().map(Bus::from).collect())
    }
}
