use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy)]
pub struct RouteTrigger {
    pub order_id: Uuid,
    pub seq: u64,
}

/// Bumps the order's trigger sequence and queues a recompute. Every driver
/// move, stage change and first-time address resolution flows through here.
pub async fn enqueue_trigger(state: &AppState, order_id: Uuid) -> Result<(), AppError> {
    let seq = {
        let mut order = state
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| AppError::NotFound(format!("order {} not found", order_id)))?;
        order.trigger_seq += 1;
        order.trigger_seq
    };

    // Counted before the send so the engine's decrement can never observe
    // the gauge below zero.
    state.metrics.triggers_in_queue.inc();

    if let Err(err) = state.trigger_tx.send(RouteTrigger { order_id, seq }).await {
        state.metrics.triggers_in_queue.dec();
        return Err(AppError::Internal(format!(
            "trigger queue send failed: {err}"
        )));
    }

    Ok(())
}

pub async fn run_route_engine(state: Arc<AppState>, mut trigger_rx: mpsc::Receiver<RouteTrigger>) {
    info!("route engine started");

    while let Some(trigger) = trigger_rx.recv().await {
        state.metrics.triggers_in_queue.dec();

        let start = Instant::now();
        let outcome = process_trigger(&state, trigger).await;
        let elapsed = start.elapsed().as_secs_f64();

        state
            .metrics
            .route_latency_seconds
            .with_label_values(&[outcome])
            .observe(elapsed);
        state
            .metrics
            .route_computations_total
            .with_label_values(&[outcome])
            .inc();
    }

    warn!("route engine stopped: trigger channel closed");
}

async fn process_trigger(state: &AppState, trigger: RouteTrigger) -> &'static str {
    let Some(order) = state.orders.get(&trigger.order_id).map(|o| o.clone()) else {
        debug!(order_id = %trigger.order_id, "trigger for unknown order");
        return "missing";
    };

    let driver_coord = order
        .driver_id
        .and_then(|driver_id| state.fix_store.read_fix(&driver_id))
        .map(|fix| fix.coordinate);

    let route = state
        .route_engine
        .compute(
            order.stage,
            driver_coord,
            order.restaurant.coordinate,
            order.customer.coordinate,
        )
        .await;

    let Some(mut entry) = state.orders.get_mut(&trigger.order_id) else {
        return "missing";
    };

    // A newer trigger was enqueued while the routing call was in flight;
    // its recomputation supersedes this result.
    if entry.trigger_seq > trigger.seq {
        debug!(order_id = %trigger.order_id, seq = trigger.seq, "stale route result dropped");
        return "stale";
    }

    let outcome = if route.route_polyline.is_empty() {
        "none"
    } else if route.is_fallback_straight_line {
        "fallback"
    } else {
        "provider"
    };

    entry.route = route;
    entry.updated_at = Utc::now();

    info!(
        order_id = %trigger.order_id,
        leg = ?entry.route.active_leg,
        outcome,
        "route state updated"
    );

    outcome
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;
    use uuid::Uuid;

    use super::{enqueue_trigger, run_route_engine};
    use crate::config::Config;
    use crate::models::address::{AddressFields, DeliveryTarget, RawAddress, TargetKind};
    use crate::models::coordinate::Coordinate;
    use crate::models::order::{OrderStage, TrackedOrder};
    use crate::models::route::{ActiveLeg, OrderRouteState};
    use crate::providers::{Geocoder, RoutePlan, RoutingBackend, TravelProfile};
    use crate::state::AppState;

    struct SlowRoute;

    #[async_trait]
    impl RoutingBackend for SlowRoute {
        async fn calculate_route(
            &self,
            from: Coordinate,
            to: Coordinate,
            _profile: TravelProfile,
        ) -> Option<RoutePlan> {
            tokio::time::sleep(Duration::from_millis(80)).await;
            Some(RoutePlan {
                polyline: vec![from, to],
                duration_seconds: 600.0,
            })
        }
    }

    struct NoGeocode;

    #[async_trait]
    impl Geocoder for NoGeocode {
        async fn geocode(&self, _query: &str) -> Option<Coordinate> {
            None
        }
    }

    fn config() -> Config {
        Config {
            http_port: 0,
            log_level: "warn".to_string(),
            routing_base_url: "http://unused".to_string(),
            routing_api_key: None,
            geocoder_base_url: "http://unused".to_string(),
            provider_timeout_ms: 100,
            average_speed_kmh: 30.0,
            min_move_meters: 50.0,
            min_move_interval_secs: 30,
            live_debounce_ms: 10,
            viewport_padding: 1.5,
            viewport_min_delta: 0.01,
            trigger_queue_size: 64,
            event_buffer_size: 64,
        }
    }

    fn target(kind: TargetKind, latitude: f64, longitude: f64) -> DeliveryTarget {
        DeliveryTarget {
            kind,
            raw: RawAddress::Structured(AddressFields {
                latitude: Some(latitude),
                longitude: Some(longitude),
                ..AddressFields::default()
            }),
            coordinate: Some(Coordinate::new(latitude, longitude)),
            formatted_address: Some("resolved".to_string()),
        }
    }

    fn insert_picked_up_order(state: &AppState) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        state.orders.insert(
            id,
            TrackedOrder {
                id,
                stage: OrderStage::PickedUp,
                driver_id: None,
                restaurant: target(TargetKind::Restaurant, 25.2, 55.3),
                customer: target(TargetKind::Customer, 25.25, 55.35),
                route: OrderRouteState::empty(ActiveLeg::None),
                trigger_seq: 0,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    #[tokio::test]
    async fn superseded_in_flight_result_is_dropped_as_stale() {
        let (state, trigger_rx) =
            AppState::new(&config(), Arc::new(SlowRoute), Arc::new(NoGeocode));
        let state = Arc::new(state);
        let order_id = insert_picked_up_order(&state);

        // Two triggers queued back to back: the first one's routing result
        // lands after a newer sequence has already been issued.
        enqueue_trigger(&state, order_id).await.unwrap();
        enqueue_trigger(&state, order_id).await.unwrap();

        tokio::spawn(run_route_engine(state.clone(), trigger_rx));

        let stale = state
            .metrics
            .route_computations_total
            .with_label_values(&["stale"]);
        let applied = state
            .metrics
            .route_computations_total
            .with_label_values(&["provider"]);

        for _ in 0..100 {
            if stale.get() == 1 && applied.get() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert_eq!(stale.get(), 1);
        assert_eq!(applied.get(), 1);

        let order = state.orders.get(&order_id).map(|o| o.clone()).unwrap();
        assert_eq!(order.trigger_seq, 2);
        assert_eq!(order.route.route_polyline.len(), 2);
        assert!(!order.route.is_fallback_straight_line);
    }

    #[tokio::test]
    async fn queue_gauge_tracks_pending_triggers() {
        let (state, trigger_rx) =
            AppState::new(&config(), Arc::new(SlowRoute), Arc::new(NoGeocode));
        let state = Arc::new(state);
        let order_id = insert_picked_up_order(&state);

        enqueue_trigger(&state, order_id).await.unwrap();
        enqueue_trigger(&state, order_id).await.unwrap();
        assert_eq!(state.metrics.triggers_in_queue.get(), 2);

        tokio::spawn(run_route_engine(state.clone(), trigger_rx));

        for _ in 0..100 {
            if state.metrics.triggers_in_queue.get() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(state.metrics.triggers_in_queue.get(), 0);
    }
}
