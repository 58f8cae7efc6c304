use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use ridelink_domain::{Booking, PassengerDetails};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::authenticate;
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking).get(list_bookings))
        .route(
            "/v1/bookings/{id}",
            get(get_booking).patch(modify_booking).delete(delete_booking),
        )
        .route("/v1/bookings/{id}/cancel", post(cancel_booking))
}

#[derive(Debug, Deserialize)]
struct CreateBookingRequest {
    bus_id: Uuid,
    travel_date: NaiveDate,
    seats: i32,
    passenger_name: String,
    passenger_email: String,
    passenger_phone: String,
}

#[derive(Debug, Deserialize)]
struct ModifyBookingRequest {
    seats: i32,
}

async fn create_booking(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    let claims = authenticate(&state.auth.secret, bearer.token())?;

    let passenger = PassengerDetails {
        name: req.passenger_name,
        email: req.passenger_email,
        phone: req.passenger_phone,
    };

    let booking = state
        .manager
        .create(&claims.sub, req.bus_id, req.travel_date, req.seats, passenger)
        .await?;
    Ok(Json(booking))
}

async fn list_bookings(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let claims = authenticate(&state.auth.secret, bearer.token())?;
    let bookings = state.manager.list_for_user(&claims.sub).await?;
    Ok(Json(bookings))
}

async fn get_booking(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let claims = authenticate(&state.auth.secret, bearer.token())?;
    let booking = state.manager.get(id, &claims.sub).await?;
    Ok(Json(booking))
}

async fn modify_booking(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ModifyBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    let claims = authenticate(&state.auth.secret, bearer.token())?;
    let booking = state.manager.modify(id, &claims.sub, req.seats).await?;
    Ok(Json(booking))
}

async fn cancel_booking(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let claims = authenticate(&state.auth.secret, bearer.token())?;
    let booking = state.manager.cancel(id, &claims.sub).await?;
    Ok(Json(booking))
}

async fn delete_booking(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let claims = authenticate(&state.auth.secret, bearer.token())?;
    state.manager.delete(id, &claims.sub).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}
