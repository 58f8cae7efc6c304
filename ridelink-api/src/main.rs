use std::net::SocketAddr;
use std::sync::Arc;

use ridelink_api::{app, state::{AppState, AuthConfig}};
use ridelink_booking::{BookingManager, PaymentOrchestrator};
use ridelink_core::{BookingRepository, BusRepository, Mailer, NotificationQueue};
use ridelink_store::{
    Config, DbClient, LogMailer, RazorpayGateway, RelayMailer, StoreBookingRepository,
    StoreBusRepository,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ridelink_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    tracing::info!("Starting RideLink API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let buses: Arc<dyn BusRepository> = Arc::new(StoreBusRepository::new(db.pool.clone()));
    let bookings: Arc<dyn BookingRepository> =
        Arc::new(StoreBookingRepository::new(db.pool.clone()));

    let gateway = Arc::new(RazorpayGateway::new(
        config.payment.key_id.clone(),
        config.payment.key_secret.clone(),
        config.payment.base_url.clone(),
    ));

    let (queue, rx) = NotificationQueue::bounded(config.notifications.queue_capacity);

    let mailer: Arc<dyn Mailer> = match &config.notifications.relay_url {
        Some(url) => Arc::new(RelayMailer::new(
            url.clone(),
            config.notifications.from_email.clone(),
        )),
        None => Arc::new(LogMailer),
    };

    tokio::spawn(ridelink_api::worker::start_notification_worker(
        rx,
        bookings.clone(),
        buses.clone(),
        mailer,
    ));

    let app_state = AppState {
        manager: Arc::new(BookingManager::new(buses, bookings.clone())),
        payments: Arc::new(PaymentOrchestrator::new(gateway, bookings, queue)),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
