use std::sync::Arc;

use crate::geo::distance_km;
use crate::models::coordinate::Coordinate;
use crate::models::order::OrderStage;
use crate::models::route::{ActiveLeg, OrderRouteState};
use crate::providers::{RoutingBackend, TravelProfile};

/// The one place order lifecycle maps to a route leg.
pub fn active_leg(stage: OrderStage) -> ActiveLeg {
    match stage {
        OrderStage::Ready | OrderStage::OutForDelivery => ActiveLeg::DriverToRestaurant,
        OrderStage::PickedUp => ActiveLeg::RestaurantToCustomer,
        OrderStage::Pending
        | OrderStage::Confirmed
        | OrderStage::Preparing
        | OrderStage::Delivered
        | OrderStage::Cancelled => ActiveLeg::None,
    }
}

pub struct RouteEngine {
    routing: Arc<dyn RoutingBackend>,
    average_speed_kmh: f64,
}

impl RouteEngine {
    pub fn new(routing: Arc<dyn RoutingBackend>, average_speed_kmh: f64) -> Self {
        Self {
            routing,
            average_speed_kmh,
        }
    }

    /// Recomputes route state for an order. Idempotent: identical inputs
    /// produce an identical result, with the routing call as the only
    /// external effect.
    pub async fn compute(
        &self,
        stage: OrderStage,
        driver: Option<Coordinate>,
        restaurant: Option<Coordinate>,
        customer: Option<Coordinate>,
    ) -> OrderRouteState {
        let leg = active_leg(stage);

        let endpoints = match leg {
            ActiveLeg::DriverToRestaurant => driver.zip(restaurant),
            ActiveLeg::RestaurantToCustomer => restaurant.zip(customer),
            ActiveLeg::None => None,
        };

        let Some((from, to)) = endpoints else {
            return OrderRouteState::empty(leg);
        };

        match self
            .routing
            .calculate_route(from, to, TravelProfile::DrivingCar)
            .await
        {
            Some(plan) => OrderRouteState {
                active_leg: leg,
                route_polyline: plan.polyline,
                eta_seconds: Some(plan.duration_seconds),
                is_fallback_straight_line: false,
            },
            None => {
                let km = distance_km(&from, &to);
                OrderRouteState {
                    active_leg: leg,
                    route_polyline: vec![from, to],
                    eta_seconds: Some(km / self.average_speed_kmh * 3600.0),
                    is_fallback_straight_line: true,
                }
            }
        }
    }
}
