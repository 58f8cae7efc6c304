use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ridelink_domain::BookingError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    Domain(BookingError),
    Anyhow(anyhow::Error),
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        Self::Domain(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}

fn domain_response(err: BookingError) -> (StatusCode, String) {
    match err {
        BookingError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
        BookingError::CapacityExceeded {
            requested,
            available,
        } => (
            StatusCode::CONFLICT,
            format!(
                "requested {} seats but only {} available",
                requested, available
            ),
        ),
        BookingError::InvalidTransition { from, to } => (
            StatusCode::CONFLICT,
            format!("cannot move booking from {} to {}", from, to),
        ),
        BookingError::InvalidState(msg) => (StatusCode::CONFLICT, msg),
        BookingError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
        BookingError::PaymentVerificationFailed => (
            StatusCode::BAD_REQUEST,
            "payment signature verification failed".to_string(),
        ),
        BookingError::Gateway(msg) => {
            tracing::error!("Payment gateway error: {}", msg);
            (StatusCode::BAD_GATEWAY, "payment gateway error".to_string())
        }
        BookingError::Storage(msg) => {
            tracing::error!("Storage error: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error".to_string(),
            )
        }
        BookingError::Notification(msg) => {
            tracing::error!("Notification error: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error".to_string(),
            )
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Domain(err) => domain_response(err),
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
