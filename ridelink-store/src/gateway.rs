use async_trait::async_trait;
use hmac::{Hmac, Mac};
use ridelink_core::{PaymentGateway, PaymentOrder};
use ridelink_domain::BookingError;
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;
use tracing::{debug, error};

type HmacSha256 = Hmac<Sha256>;

/// Razorpay Orders API client. Order creation goes over HTTP with basic
/// auth; callback signatures are verified locally with the key secret.
pub struct RazorpayGateway {
    key_id: String,
    key_secret: String,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct OrderResponse {
    id: String,
    amount: i64,
    currency: String,
}

impl RazorpayGateway {
    pub fn new(key_id: String, key_secret: String, base_url: String) -> Self {
        Self {
            key_id,
            key_secret,
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Signature over `"{order_id}|{payment_id}"`, hex-encoded. Matches what
    /// the gateway sends in its checkout callback.
    fn compute_signature(&self, order_id: &str, payment_id: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.key_secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(
        &self,
        amount_minor: i32,
        currency: &str,
        receipt: &str,
    ) -> Result<PaymentOrder, BookingError> {
        let url = format!("{}/v1/orders", self.base_url);
        let body = json!({
            "amount": amount_minor,
            "currency": currency,
            "receipt": receipt,
            "payment_capture": 1,
        });

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| BookingError::Gateway(format!("order request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            error!(%status, "payment gateway rejected order creation");
            return Err(BookingError::Gateway(format!(
                "gateway returned {}: {}",
                status, detail
            )));
        }

        let order: OrderResponse = response
            .json()
            .await
            .map_err(|e| BookingError::Gateway(format!("malformed order response: {}", e)))?;

        debug!(order_id = %order.id, amount = order.amount, "created payment order");
        Ok(PaymentOrder {
            id: order.id,
            amount_minor: order.amount as i32,
            currency: order.currency,
        })
    }

    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        let expected = self.compute_signature(order_id, payment_id);
        constant_time_eq(expected.as_bytes(), signature.as_bytes())
    }

    fn method_name(&self) -> &str {
        "Razorpay"
    }
}
