pub mod manager;
pub mod payments;

pub use manager::{BookingManager, BusSearchResult};
pub use payments::{ConfirmOutcome, PaymentOrchestrator};
