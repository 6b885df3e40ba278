use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub routing_base_url: String,
    pub routing_api_key: Option<String>,
    pub geocoder_base_url: String,
    pub provider_timeout_ms: u64,
    pub average_speed_kmh: f64,
    pub min_move_meters: f64,
    pub min_move_interval_secs: i64,
    pub live_debounce_ms: u64,
    pub viewport_padding: f64,
    pub viewport_min_delta: f64,
    pub trigger_queue_size: usize,
    pub event_buffer_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            routing_base_url: env::var("ROUTING_BASE_URL")
                .unwrap_or_else(|_| "https://api.openrouteservice.org".to_string()),
            routing_api_key: env::var("ROUTING_API_KEY").ok(),
            geocoder_base_url: env::var("GEOCODER_BASE_URL")
                .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string()),
            provider_timeout_ms: parse_or_default("PROVIDER_TIMEOUT_MS", 5_000)?,
            average_speed_kmh: parse_or_default("AVERAGE_SPEED_KMH", 30.0)?,
            min_move_meters: parse_or_default("MIN_MOVE_METERS", 50.0)?,
            min_move_interval_secs: parse_or_default("MIN_MOVE_INTERVAL_SECS", 30)?,
            live_debounce_ms: parse_or_default("LIVE_DEBOUNCE_MS", 1_000)?,
            viewport_padding: parse_or_default("VIEWPORT_PADDING", 1.5)?,
            viewport_min_delta: parse_or_default("VIEWPORT_MIN_DELTA", 0.01)?,
            trigger_queue_size: parse_or_default("TRIGGER_QUEUE_SIZE", 1024)?,
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
