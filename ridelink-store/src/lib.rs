pub mod app_config;
pub mod booking_repo;
pub mod bus_repo;
pub mod database;
pub mod gateway;
pub mod mailer;

pub use app_config::Config;
pub use booking_repo::StoreBookingRepository;
pub use bus_repo::StoreBusRepository;
pub use database::DbClient;
pub use gateway::RazorpayGateway;
pub use mailer::{LogMailer, RelayMailer};
