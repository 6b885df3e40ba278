use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::engine::refresh::enqueue_trigger;
use crate::engine::route::active_leg;
use crate::error::AppError;
use crate::models::address::{DeliveryTarget, RawAddress, TargetKind};
use crate::models::coordinate::{Coordinate, ViewportRegion};
use crate::models::order::{OrderStage, TrackedOrder};
use crate::models::route::{ActiveLeg, OrderRouteState};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/stage", patch(update_stage))
        .route("/orders/:id/driver", patch(assign_driver))
        .route("/orders/:id/route", get(get_route))
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub restaurant_address: RawAddress,
    pub customer_address: RawAddress,
    pub driver_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct UpdateStageRequest {
    pub stage: OrderStage,
}

#[derive(Deserialize)]
pub struct AssignDriverRequest {
    pub driver_id: Uuid,
}

#[derive(Serialize)]
pub struct RouteView {
    pub active_leg: ActiveLeg,
    pub route_polyline: Vec<Coordinate>,
    pub eta_seconds: Option<f64>,
    pub eta_display: Option<String>,
    pub is_fallback_straight_line: bool,
    pub viewport: ViewportRegion,
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<TrackedOrder>, AppError> {
    let now = Utc::now();
    let order = TrackedOrder {
        id: Uuid::new_v4(),
        stage: OrderStage::Pending,
        driver_id: payload.driver_id,
        restaurant: DeliveryTarget::unresolved(TargetKind::Restaurant, payload.restaurant_address),
        customer: DeliveryTarget::unresolved(TargetKind::Customer, payload.customer_address),
        route: OrderRouteState::empty(ActiveLeg::None),
        trigger_seq: 0,
        created_at: now,
        updated_at: now,
    };

    state.orders.insert(order.id, order.clone());
    tokio::spawn(resolve_order_targets(state.clone(), order.id));

    Ok(Json(order))
}

// Resolution runs off the request path; the first recompute fires once both
// targets have been attempted.
async fn resolve_order_targets(state: Arc<AppState>, order_id: Uuid) {
    let raws = state
        .orders
        .get(&order_id)
        .map(|order| (order.restaurant.raw.clone(), order.customer.raw.clone()));
    let Some((restaurant_raw, customer_raw)) = raws else {
        return;
    };

    let restaurant = state.resolver.resolve(&restaurant_raw).await;
    let customer = state.resolver.resolve(&customer_raw).await;

    for resolved in [&restaurant, &customer] {
        let outcome = if resolved.coordinate.is_some() {
            "resolved"
        } else {
            "unresolved"
        };
        state
            .metrics
            .resolutions_total
            .with_label_values(&[outcome])
            .inc();
    }

    {
        let Some(mut order) = state.orders.get_mut(&order_id) else {
            return;
        };
        order
            .restaurant
            .apply_resolution(restaurant.coordinate, restaurant.formatted_address);
        order
            .customer
            .apply_resolution(customer.coordinate, customer.formatted_address);
        order.updated_at = Utc::now();
    }

    if let Err(err) = enqueue_trigger(&state, order_id).await {
        debug!(order_id = %order_id, error = %err, "post-resolution trigger failed");
    }
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TrackedOrder>, AppError> {
    let order = state
        .orders
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("order {} not found", id)))?;

    Ok(Json(order.value().clone()))
}

async fn update_stage(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStageRequest>,
) -> Result<Json<TrackedOrder>, AppError> {
    let order = {
        let mut order = state
            .orders
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("order {} not found", id)))?;

        order.stage = payload.stage;
        order.updated_at = Utc::now();
        order.clone()
    };

    enqueue_trigger(&state, id).await?;
    Ok(Json(order))
}

async fn assign_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignDriverRequest>,
) -> Result<Json<TrackedOrder>, AppError> {
    let order = {
        let mut order = state
            .orders
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("order {} not found", id)))?;

        order.driver_id = Some(payload.driver_id);
        order.updated_at = Utc::now();
        order.clone()
    };

    enqueue_trigger(&state, id).await?;
    Ok(Json(order))
}

async fn get_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RouteView>, AppError> {
    let order = state
        .orders
        .get(&id)
        .map(|order| order.clone())
        .ok_or_else(|| AppError::NotFound(format!("order {} not found", id)))?;

    let driver_coord = order
        .driver_id
        .and_then(|driver_id| state.fix_store.read_fix(&driver_id))
        .map(|fix| fix.coordinate);

    let leg = active_leg(order.stage);
    let mut points: Vec<Coordinate> = Vec::new();
    if leg != ActiveLeg::None {
        points.extend(driver_coord);
        points.extend(order.restaurant.coordinate);
        points.extend(order.customer.coordinate);
    }

    let viewport = state.viewport.fit(&points, driver_coord);

    Ok(Json(RouteView {
        active_leg: order.route.active_leg,
        route_polyline: order.route.route_polyline.clone(),
        eta_seconds: order.route.eta_seconds,
        eta_display: order.route.eta_display(),
        is_fallback_straight_line: order.route.is_fallback_straight_line,
        viewport,
    }))
}
