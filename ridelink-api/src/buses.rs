use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use ridelink_booking::BusSearchResult;
use ridelink_domain::{Bus, SeatAvailability};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/buses", get(list_buses))
        .route("/v1/buses/search", get(search_buses))
        .route("/v1/buses/{id}", get(get_bus))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    source: Option<String>,
    destination: Option<String>,
    date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct DateParam {
    date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct BusDetail {
    #[serde(flatten)]
    bus: Bus,
    #[serde(skip_serializing_if = "Option::is_none")]
    availability: Option<SeatAvailability>,
}

async fn list_buses(State(state): State<AppState>) -> Result<Json<Vec<Bus>>, AppError> {
    let results = state.manager.search(None, None, None).await?;
    Ok(Json(results.into_iter().map(|r| r.bus).collect()))
}

async fn search_buses(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<BusSearchResult>>, AppError> {
    let results = state
        .manager
        .search(
            params.source.as_deref(),
            params.destination.as_deref(),
            params.date,
        )
        .await?;
    Ok(Json(results))
}

async fn get_bus(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<DateParam>,
) -> Result<Json<BusDetail>, AppError> {
    let bus = state
        .manager
        .get_bus(id)
        .await?;

    let availability = match params.date {
        Some(date) => Some(state.manager.availability(id, date).await?),
        None => None,
    };

    Ok(Json(BusDetail { bus, availability }))
}
