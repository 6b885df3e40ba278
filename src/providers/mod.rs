pub mod geocode;
pub mod routing;

pub use geocode::{Geocoder, NominatimGeocoder};
pub use routing::{OrsRouting, RoutePlan, RoutingBackend, TravelProfile};
