use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::models::coordinate::Coordinate;

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Forward-geocodes a freeform address. Any provider failure is absence,
    /// never an error.
    async fn geocode(&self, query: &str) -> Option<Coordinate>;
}

pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct NominatimHit {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        // Falling back to a default client would drop the deadline, so a
        // broken builder is fatal at startup.
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("delivery-tracker")
            .build()
            .expect("geocoding http client with timeout");

        Self { client, base_url }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, query: &str) -> Option<Coordinate> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));

        let response = match self
            .client
            .get(&url)
            .query(&[("format", "json"), ("limit", "1"), ("q", query)])
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "geocoding request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "geocoding returned non-success");
            return None;
        }

        let hits: Vec<NominatimHit> = match response.json().await {
            Ok(hits) => hits,
            Err(err) => {
                warn!(error = %err, "geocoding payload was not valid json");
                return None;
            }
        };

        let hit = hits.into_iter().next()?;
        let latitude = hit.lat.parse::<f64>().ok()?;
        let longitude = hit.lon.parse::<f64>().ok()?;

        let coordinate = Coordinate::new(latitude, longitude);
        coordinate.is_finite().then_some(coordinate)
    }
}
