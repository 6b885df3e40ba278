use serde::{Deserialize, Serialize};

use crate::models::coordinate::Coordinate;

pub const ADDRESS_NOT_AVAILABLE: &str = "Address not available";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAddress {
    Structured(AddressFields),
    Text(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddressFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<NestedCoordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(
        default,
        alias = "postal_code",
        alias = "postalCode",
        skip_serializing_if = "Option::is_none"
    )]
    pub postal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NestedCoordinates {
    #[serde(default, alias = "lat")]
    pub latitude: Option<f64>,
    #[serde(default, alias = "lng")]
    pub longitude: Option<f64>,
}

impl AddressFields {
    pub fn extract_coordinate(&self) -> Option<Coordinate> {
        let candidate = match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)),
            _ => match (self.lat, self.lng) {
                (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)),
                _ => self.coordinates.as_ref().and_then(|nested| {
                    match (nested.latitude, nested.longitude) {
                        (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)),
                        _ => None,
                    }
                }),
            },
        };

        candidate.filter(Coordinate::is_finite)
    }

    pub fn formatted(&self) -> String {
        let parts: Vec<&str> = [
            &self.line1,
            &self.line2,
            &self.city,
            &self.state,
            &self.postal,
            &self.country,
        ]
        .into_iter()
        .filter_map(|part| part.as_deref())
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

        if parts.is_empty() {
            ADDRESS_NOT_AVAILABLE.to_string()
        } else {
            parts.join(", ")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Restaurant,
    Customer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryTarget {
    pub kind: TargetKind,
    pub raw: RawAddress,
    pub coordinate: Option<Coordinate>,
    pub formatted_address: Option<String>,
}

impl DeliveryTarget {
    pub fn unresolved(kind: TargetKind, raw: RawAddress) -> Self {
        Self {
            kind,
            raw,
            coordinate: None,
            formatted_address: None,
        }
    }

    // Resolution is cached: the first completed resolution wins for the
    // lifetime of the order view.
    pub fn apply_resolution(&mut self, coordinate: Option<Coordinate>, formatted: String) {
        if self.formatted_address.is_some() {
            return;
        }
        self.coordinate = coordinate;
        self.formatted_address = Some(formatted);
    }
}
