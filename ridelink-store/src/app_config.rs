use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub payment: PaymentConfig,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentConfig {
    pub key_id: String,
    pub key_secret: String,
    #[serde(default = "default_gateway_url")]
    pub base_url: String,
}

fn default_gateway_url() -> String {
    "https://api.razorpay.com".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationConfig {
    pub from_email: String,
    /// HTTP mail relay endpoint; when unset, messages are logged instead.
    pub relay_url: Option<String>,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_queue_capacity() -> usize {
    256
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Environment-specific file, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `RIDELINK__SERVER__PORT=8080`
            .add_source(config::Environment::with_prefix("RIDELINK").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
