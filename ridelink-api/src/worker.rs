use std::sync::Arc;

use ridelink_core::{BookingNotification, BookingRepository, BusRepository, EmailMessage, Mailer};
use ridelink_domain::{Booking, Bus};
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

const SEND_ATTEMPTS: u32 = 3;

/// Drains the confirmation channel and delivers booking emails. Delivery
/// failures are retried a bounded number of times and then dropped with a
/// log line; nothing here can affect the payment path.
pub async fn start_notification_worker(
    mut rx: mpsc::Receiver<BookingNotification>,
    bookings: Arc<dyn BookingRepository>,
    buses: Arc<dyn BusRepository>,
    mailer: Arc<dyn Mailer>,
) {
    info!("Notification worker started, waiting for confirmations...");

    while let Some(notification) = rx.recv().await {
        if let Err(e) = deliver(&notification, &bookings, &buses, &mailer).await {
            error!(
                "Giving up on confirmation for booking {}: {}",
                notification.booking_id, e
            );
        }
    }

    info!("Notification channel closed, worker exiting");
}

async fn deliver(
    notification: &BookingNotification,
    bookings: &Arc<dyn BookingRepository>,
    buses: &Arc<dyn BusRepository>,
    mailer: &Arc<dyn Mailer>,
) -> Result<(), String> {
    let booking = bookings
        .get_booking(notification.booking_id)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| "booking no longer exists".to_string())?;

    let bus = buses
        .get_bus(booking.bus_id)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| "bus no longer exists".to_string())?;

    let message = compose(&booking, &bus);

    let mut last_err = String::new();
    for attempt in 1..=SEND_ATTEMPTS {
        match mailer.send(&message).await {
            Ok(diagnostic) => {
                info!("Notification for booking {}: {}", booking.booking_reference, diagnostic);
                return Ok(());
            }
            Err(e) => {
                warn!(
                    "Send attempt {}/{} failed for booking {}: {}",
                    attempt, SEND_ATTEMPTS, booking.booking_reference, e
                );
                last_err = e.to_string();
                if attempt < SEND_ATTEMPTS {
                    sleep(Duration::from_secs(2u64.pow(attempt))).await;
                }
            }
        }
    }
    Err(last_err)
}

fn compose(booking: &Booking, bus: &Bus) -> EmailMessage {
    let amount = booking.total_price_minor as f64 / 100.0;
    let body = format!(
        "Dear {},\n\n\
         Your bus ticket booking is confirmed!\n\n\
         Booking reference: {}\n\
         Bus: {} ({})\n\
         Route: {} to {}\n\
         Travel date: {}\n\
         Departure: {}  Arrival: {}\n\
         Seats: {}\n\
         Amount paid: {:.2} {}\n\n\
         Have a pleasant journey!",
        booking.passenger_name,
        booking.booking_reference,
        bus.bus_name,
        bus.bus_number,
        bus.source,
        bus.destination,
        booking.travel_date,
        bus.departure_time,
        bus.arrival_time,
        booking.seats_booked,
        amount,
        booking.currency,
    );

    EmailMessage {
        to: booking.passenger_email.clone(),
        subject: format!("Booking confirmed: {}", booking.booking_reference),
        body,
    }
}
