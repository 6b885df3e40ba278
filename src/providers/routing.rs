use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::models::coordinate::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelProfile {
    DrivingCar,
    CyclingRegular,
    FootWalking,
}

impl TravelProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelProfile::DrivingCar => "driving-car",
            TravelProfile::CyclingRegular => "cycling-regular",
            TravelProfile::FootWalking => "foot-walking",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoutePlan {
    pub polyline: Vec<Coordinate>,
    pub duration_seconds: f64,
}

#[async_trait]
pub trait RoutingBackend: Send + Sync {
    /// Returns the route between two points, or `None` on any transport,
    /// status, timeout or payload failure. Callers treat absence as "no
    /// route", never as an error, and own any retry policy.
    async fn calculate_route(
        &self,
        from: Coordinate,
        to: Coordinate,
        profile: TravelProfile,
    ) -> Option<RoutePlan>;
}

pub struct OrsRouting {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct OrsResponse {
    features: Vec<OrsFeature>,
}

#[derive(Deserialize)]
struct OrsFeature {
    geometry: OrsGeometry,
    properties: OrsProperties,
}

#[derive(Deserialize)]
struct OrsGeometry {
    coordinates: Vec<Vec<f64>>,
}

#[derive(Deserialize)]
struct OrsProperties {
    summary: OrsSummary,
}

#[derive(Deserialize)]
struct OrsSummary {
    duration: f64,
}

impl OrsRouting {
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> Self {
        // Falling back to a default client would drop the deadline, so a
        // broken builder is fatal at startup.
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("delivery-tracker")
            .build()
            .expect("routing http client with timeout");

        Self {
            client,
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl RoutingBackend for OrsRouting {
    async fn calculate_route(
        &self,
        from: Coordinate,
        to: Coordinate,
        profile: TravelProfile,
    ) -> Option<RoutePlan> {
        let url = format!(
            "{}/v2/directions/{}/geojson",
            self.base_url.trim_end_matches('/'),
            profile.as_str()
        );

        // GeoJSON ordering: [longitude, latitude].
        let body = json!({
            "coordinates": [
                [from.longitude, from.latitude],
                [to.longitude, to.latitude],
            ]
        });

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", key);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "routing request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "routing returned non-success");
            return None;
        }

        let payload: OrsResponse = match response.json().await {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "routing payload was not valid geojson");
                return None;
            }
        };

        let feature = payload.features.into_iter().next()?;

        let polyline: Vec<Coordinate> = feature
            .geometry
            .coordinates
            .iter()
            .filter_map(|pair| match pair.as_slice() {
                [lng, lat, ..] => {
                    let point = Coordinate::new(*lat, *lng);
                    point.is_finite().then_some(point)
                }
                _ => None,
            })
            .collect();

        let duration = feature.properties.summary.duration;
        if polyline.is_empty() || !duration.is_finite() || duration < 0.0 {
            warn!("routing payload had no usable polyline");
            return None;
        }

        Some(RoutePlan {
            polyline,
            duration_seconds: duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::OrsRouting;
    use crate::providers::geocode::NominatimGeocoder;

    #[test]
    fn clients_construct_with_deadline() {
        let _ = OrsRouting::new(
            "http://localhost:8080".to_string(),
            Some("key".to_string()),
            Duration::from_millis(250),
        );
        let _ = NominatimGeocoder::new(
            "http://localhost:8080".to_string(),
            Duration::from_millis(250),
        );
    }
}
