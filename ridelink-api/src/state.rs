use std::sync::Arc;

use ridelink_booking::{BookingManager, PaymentOrchestrator};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<BookingManager>,
    pub payments: Arc<PaymentOrchestrator>,
    pub auth: AuthConfig,
}
