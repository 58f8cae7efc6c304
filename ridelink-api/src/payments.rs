use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use ridelink_booking::ConfirmOutcome;
use ridelink_core::PaymentOrder;
use ridelink_domain::Booking;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::authenticate;
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings/{id}/payment-order", post(create_payment_order))
        .route("/v1/bookings/{id}/payment-failed", post(payment_failed))
        // Called by the gateway, not the user; the HMAC signature is the
        // authentication.
        .route("/v1/payments/callback", post(payment_callback))
}

#[derive(Debug, Serialize)]
struct PaymentOrderResponse {
    order_id: String,
    amount: i32,
    currency: String,
}

async fn create_payment_order(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentOrderResponse>, AppError> {
    let claims = authenticate(&state.auth.secret, bearer.token())?;
    let order: PaymentOrder = state.payments.initiate(id, &claims.sub).await?;

    Ok(Json(PaymentOrderResponse {
        order_id: order.id,
        amount: order.amount_minor,
        currency: order.currency,
    }))
}

#[derive(Debug, Deserialize)]
struct CallbackRequest {
    razorpay_order_id: String,
    razorpay_payment_id: String,
    razorpay_signature: String,
}

#[derive(Debug, Serialize)]
struct CallbackResponse {
    status: String,
    booking_reference: String,
}

async fn payment_callback(
    State(state): State<AppState>,
    Json(req): Json<CallbackRequest>,
) -> Result<Json<CallbackResponse>, AppError> {
    let outcome = state
        .payments
        .confirm(
            &req.razorpay_order_id,
            &req.razorpay_payment_id,
            &req.razorpay_signature,
        )
        .await?;

    let status = match &outcome {
        ConfirmOutcome::Confirmed(_) => "confirmed",
        ConfirmOutcome::AlreadyConfirmed(_) => "already_confirmed",
    };

    Ok(Json(CallbackResponse {
        status: status.to_string(),
        booking_reference: outcome.booking().booking_reference.clone(),
    }))
}

async fn payment_failed(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let claims = authenticate(&state.auth.secret, bearer.token())?;
    let booking = state.payments.mark_failed(id, &claims.sub).await?;
    Ok(Json(booking))
}
