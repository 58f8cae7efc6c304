pub mod notify;
pub mod payment;
pub mod repository;

pub use notify::{BookingNotification, EmailMessage, Mailer, NotificationQueue};
pub use payment::{PaymentGateway, PaymentOrder};
pub use repository::{BookingRepository, BusRepository, PaymentCompletion};
