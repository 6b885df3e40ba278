use crate::models::coordinate::{Coordinate, ViewportRegion};

const EARTH_RADIUS_KM: f64 = 6_371.0;

pub fn haversine_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lng = (b.longitude - a.longitude).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

/// Display distance, rounded to one decimal place.
pub fn distance_km(a: &Coordinate, b: &Coordinate) -> f64 {
    (haversine_km(a, b) * 10.0).round() / 10.0
}

pub fn estimated_travel_minutes(distance_km: f64, average_speed_kmh: f64) -> u32 {
    if average_speed_kmh <= 0.0 {
        return 0;
    }
    (distance_km / average_speed_kmh * 60.0).round() as u32
}

pub fn midpoint(a: &Coordinate, b: &Coordinate) -> Coordinate {
    Coordinate::new(
        (a.latitude + b.latitude) / 2.0,
        (a.longitude + b.longitude) / 2.0,
    )
}

/// Region fitting all points. Deltas never drop below `min_delta`, so a
/// single point yields a tight fixed-size viewport instead of a degenerate
/// zero-area one.
pub fn bounding_region(
    points: &[Coordinate],
    padding_factor: f64,
    min_delta: f64,
) -> Option<ViewportRegion> {
    let first = points.first()?;

    let mut min_lat = first.latitude;
    let mut max_lat = first.latitude;
    let mut min_lng = first.longitude;
    let mut max_lng = first.longitude;

    for point in &points[1..] {
        min_lat = min_lat.min(point.latitude);
        max_lat = max_lat.max(point.latitude);
        min_lng = min_lng.min(point.longitude);
        max_lng = max_lng.max(point.longitude);
    }

    Some(ViewportRegion {
        center: Coordinate::new((min_lat + max_lat) / 2.0, (min_lng + max_lng) / 2.0),
        latitude_delta: ((max_lat - min_lat) * padding_factor).max(min_delta),
        longitude_delta: ((max_lng - min_lng) * padding_factor).max(min_delta),
    })
}
