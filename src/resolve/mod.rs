use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::address::{AddressFields, RawAddress};
use crate::models::coordinate::Coordinate;
use crate::providers::Geocoder;

// Last-resort extraction for coordinates embedded in freeform text,
// e.g. "lat:25.2,lng:55.3".
static EMBEDDED_COORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"lat:\s*(-?\d+(?:\.\d+)?)\s*,\s*lng:\s*(-?\d+(?:\.\d+)?)")
        .expect("valid embedded-coordinates regex")
});

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTarget {
    pub coordinate: Option<Coordinate>,
    pub formatted_address: String,
}

/// Normalizes heterogeneous address representations into a coordinate plus a
/// display address. Never fails: an unresolvable address yields no
/// coordinate, and downstream consumers skip the affected leg.
#[derive(Clone)]
pub struct AddressResolver {
    geocoder: Arc<dyn Geocoder>,
}

impl AddressResolver {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self { geocoder }
    }

    pub async fn resolve(&self, raw: &RawAddress) -> ResolvedTarget {
        match raw {
            RawAddress::Structured(fields) => Self::from_fields(fields),
            RawAddress::Text(text) => match serde_json::from_str::<AddressFields>(text) {
                Ok(fields) => Self::from_fields(&fields),
                Err(_) => self.resolve_freeform(text).await,
            },
        }
    }

    fn from_fields(fields: &AddressFields) -> ResolvedTarget {
        ResolvedTarget {
            coordinate: fields.extract_coordinate(),
            formatted_address: fields.formatted(),
        }
    }

    async fn resolve_freeform(&self, text: &str) -> ResolvedTarget {
        let coordinate = match self.geocoder.geocode(text).await {
            Some(coordinate) => Some(coordinate),
            None => embedded_coordinate(text),
        };

        ResolvedTarget {
            coordinate,
            formatted_address: text.to_string(),
        }
    }
}

fn embedded_coordinate(text: &str) -> Option<Coordinate> {
    let captures = EMBEDDED_COORDS.captures(text)?;
    let latitude = captures.get(1)?.as_str().parse::<f64>().ok()?;
    let longitude = captures.get(2)?.as_str().parse::<f64>().ok()?;

    let coordinate = Coordinate::new(latitude, longitude);
    coordinate.is_finite().then_some(coordinate)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::{AddressResolver, ResolvedTarget};
    use crate::models::address::{
        AddressFields, NestedCoordinates, RawAddress, ADDRESS_NOT_AVAILABLE,
    };
    use crate::models::coordinate::Coordinate;
    use crate::providers::Geocoder;

    struct FixedGeocoder(Option<Coordinate>);

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn geocode(&self, _query: &str) -> Option<Coordinate> {
            self.0
        }
    }

    fn resolver(geocoded: Option<Coordinate>) -> AddressResolver {
        AddressResolver::new(Arc::new(FixedGeocoder(geocoded)))
    }

    async fn resolve(resolver: &AddressResolver, raw: RawAddress) -> ResolvedTarget {
        resolver.resolve(&raw).await
    }

    #[tokio::test]
    async fn structured_coordinates_are_used_directly() {
        let raw = RawAddress::Structured(AddressFields {
            latitude: Some(25.2),
            longitude: Some(55.3),
            city: Some("Dubai".to_string()),
            ..AddressFields::default()
        });

        let resolved = resolve(&resolver(None), raw).await;
        assert_eq!(resolved.coordinate, Some(Coordinate::new(25.2, 55.3)));
        assert_eq!(resolved.formatted_address, "Dubai");
    }

    #[tokio::test]
    async fn json_string_yields_coordinate_and_formatted_address() {
        let raw = RawAddress::Text(
            r#"{"latitude":25.2,"longitude":55.3,"city":"Dubai","country":"UAE"}"#.to_string(),
        );

        let resolved = resolve(&resolver(None), raw).await;
        assert_eq!(resolved.coordinate, Some(Coordinate::new(25.2, 55.3)));
        assert_eq!(resolved.formatted_address, "Dubai, UAE");
    }

    #[tokio::test]
    async fn json_string_without_address_parts_has_placeholder() {
        let raw = RawAddress::Text(r#"{"lat":25.2,"lng":55.3}"#.to_string());

        let resolved = resolve(&resolver(None), raw).await;
        assert_eq!(resolved.coordinate, Some(Coordinate::new(25.2, 55.3)));
        assert_eq!(resolved.formatted_address, ADDRESS_NOT_AVAILABLE);
    }

    #[tokio::test]
    async fn nested_coordinates_object_is_extracted() {
        let raw = RawAddress::Structured(AddressFields {
            coordinates: Some(NestedCoordinates {
                latitude: Some(25.2),
                longitude: Some(55.3),
            }),
            line1: Some("Marina Walk".to_string()),
            city: Some("Dubai".to_string()),
            ..AddressFields::default()
        });

        let resolved = resolve(&resolver(None), raw).await;
        assert_eq!(resolved.coordinate, Some(Coordinate::new(25.2, 55.3)));
        assert_eq!(resolved.formatted_address, "Marina Walk, Dubai");
    }

    #[tokio::test]
    async fn freeform_string_is_geocoded() {
        let geocoded = Coordinate::new(25.1972, 55.2744);
        let raw = RawAddress::Text("Burj Khalifa, Dubai".to_string());

        let resolved = resolve(&resolver(Some(geocoded)), raw).await;
        assert_eq!(resolved.coordinate, Some(geocoded));
        assert_eq!(resolved.formatted_address, "Burj Khalifa, Dubai");
    }

    #[tokio::test]
    async fn embedded_pattern_rescues_failed_geocoding() {
        let raw = RawAddress::Text("lat:25.2,lng:55.3".to_string());

        let resolved = resolve(&resolver(None), raw).await;
        assert_eq!(resolved.coordinate, Some(Coordinate::new(25.2, 55.3)));
        assert_eq!(resolved.formatted_address, "lat:25.2,lng:55.3");
    }

    #[tokio::test]
    async fn unresolvable_address_keeps_original_text() {
        let raw = RawAddress::Text("somewhere far away".to_string());

        let resolved = resolve(&resolver(None), raw).await;
        assert_eq!(resolved.coordinate, None);
        assert_eq!(resolved.formatted_address, "somewhere far away");
    }
}
