/// Error kinds shared across the booking engine. All of these are
/// recoverable at the request boundary and leave persisted state unchanged.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("capacity exceeded: requested {requested}, available {available}")]
    CapacityExceeded { requested: i32, available: i32 },

    #[error("invalid payment state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("operation not permitted in current state: {0}")]
    InvalidState(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("payment signature verification failed")]
    PaymentVerificationFailed,

    #[error("payment gateway error: {0}")]
    Gateway(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("notification delivery failed: {0}")]
    Notification(String),
}
