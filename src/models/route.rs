use serde::{Deserialize, Serialize};

use crate::models::coordinate::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveLeg {
    DriverToRestaurant,
    RestaurantToCustomer,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRouteState {
    pub active_leg: ActiveLeg,
    pub route_polyline: Vec<Coordinate>,
    pub eta_seconds: Option<f64>,
    pub is_fallback_straight_line: bool,
}

impl OrderRouteState {
    pub fn empty(active_leg: ActiveLeg) -> Self {
        Self {
            active_leg,
            route_polyline: Vec::new(),
            eta_seconds: None,
            is_fallback_straight_line: false,
        }
    }

    pub fn eta_display(&self) -> Option<String> {
        self.eta_seconds.map(|seconds| {
            let minutes = (seconds / 60.0).ceil().max(0.0) as i64;
            format!("{minutes} min")
        })
    }
}
