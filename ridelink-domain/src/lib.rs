pub mod availability;
pub mod booking;
pub mod bus;
pub mod error;

pub use availability::SeatAvailability;
pub use booking::{Booking, PassengerDetails, PaymentStatus};
pub use bus::Bus;
pub use error::BookingError;
