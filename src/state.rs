use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::Config;
use crate::engine::refresh::RouteTrigger;
use crate::engine::route::RouteEngine;
use crate::engine::viewport::ViewportFitter;
use crate::models::order::TrackedOrder;
use crate::observability::metrics::Metrics;
use crate::providers::{Geocoder, RoutingBackend};
use crate::resolve::AddressResolver;
use crate::store::FixStore;
use crate::tracking::{LiveLocationChannel, TrackingSession};

pub struct AppState {
    pub orders: DashMap<Uuid, TrackedOrder>,
    pub sessions: DashMap<Uuid, Arc<TrackingSession>>,
    pub fix_store: Arc<FixStore>,
    pub live: Arc<LiveLocationChannel>,
    pub resolver: AddressResolver,
    pub route_engine: RouteEngine,
    pub viewport: ViewportFitter,
    pub trigger_tx: mpsc::Sender<RouteTrigger>,
    pub metrics: Metrics,
    pub min_move_meters: f64,
    pub min_move_interval_secs: i64,
}

impl AppState {
    pub fn new(
        config: &Config,
        routing: Arc<dyn RoutingBackend>,
        geocoder: Arc<dyn Geocoder>,
    ) -> (Self, mpsc::Receiver<RouteTrigger>) {
        let (trigger_tx, trigger_rx) = mpsc::channel(config.trigger_queue_size);

        (
            Self {
                orders: DashMap::new(),
                sessions: DashMap::new(),
                fix_store: Arc::new(FixStore::new()),
                live: Arc::new(LiveLocationChannel::new(
                    Duration::from_millis(config.live_debounce_ms),
                    config.event_buffer_size,
                )),
                resolver: AddressResolver::new(geocoder),
                route_engine: RouteEngine::new(routing, config.average_speed_kmh),
                viewport: ViewportFitter::new(config.viewport_padding, config.viewport_min_delta),
                trigger_tx,
                metrics: Metrics::new(),
                min_move_meters: config.min_move_meters,
                min_move_interval_secs: config.min_move_interval_secs,
            },
            trigger_rx,
        )
    }
}
