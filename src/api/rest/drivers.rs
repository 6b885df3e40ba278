use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::engine::refresh::enqueue_trigger;
use crate::error::AppError;
use crate::models::coordinate::Coordinate;
use crate::models::fix::{DriverFix, FixSource};
use crate::state::AppState;
use crate::tracking::TrackingSession;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers/:id/online", post(go_online))
        .route("/drivers/:id/offline", post(go_offline))
        .route("/drivers/:id/fixes", post(ingest_fix))
        .route("/drivers/:id/location", get(get_location))
}

#[derive(Deserialize)]
pub struct GoOnlineRequest {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Deserialize)]
pub struct IngestFixRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub captured_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub driver_id: Uuid,
    pub online: bool,
}

#[derive(Serialize)]
pub struct FixResponse {
    pub accepted: bool,
}

async fn go_online(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<GoOnlineRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let initial = Coordinate::new(payload.latitude, payload.longitude);
    if !initial.is_finite() {
        return Err(AppError::BadRequest(
            "initial coordinate must be finite".to_string(),
        ));
    }

    let session = TrackingSession::new(
        id,
        state.min_move_meters,
        state.min_move_interval_secs,
        state.fix_store.clone(),
        state.live.clone(),
    );

    // Atomic reservation: concurrent online requests race for the entry and
    // only one wins.
    match state.sessions.entry(id) {
        Entry::Occupied(_) => {
            return Err(AppError::Conflict(format!("driver {} already online", id)));
        }
        Entry::Vacant(slot) => {
            slot.insert(session.clone());
        }
    }

    // The driver app reports its position once when going online; this is
    // the session's authoritative one-shot fix.
    session
        .ingest(DriverFix::now(initial, FixSource::OneShot))
        .await;
    state
        .metrics
        .fixes_total
        .with_label_values(&["accepted"])
        .inc();

    trigger_driver_orders(&state, id).await;

    Ok(Json(SessionResponse {
        driver_id: id,
        online: true,
    }))
}

async fn go_offline(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Json<SessionResponse> {
    // Idempotent: going offline twice, or before ever going online, is fine.
    if let Some((_, session)) = state.sessions.remove(&id) {
        session.stop().await;
    }

    Json(SessionResponse {
        driver_id: id,
        online: false,
    })
}

async fn ingest_fix(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<IngestFixRequest>,
) -> Result<Json<FixResponse>, AppError> {
    let coordinate = Coordinate::new(payload.latitude, payload.longitude);
    if !coordinate.is_finite() {
        return Err(AppError::BadRequest(
            "coordinate must be finite".to_string(),
        ));
    }

    let session = state
        .sessions
        .get(&id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("driver {} is not online", id)))?;

    let fix = DriverFix {
        coordinate,
        captured_at: payload.captured_at.unwrap_or_else(Utc::now),
        source: FixSource::Remote,
    };

    let accepted = session.ingest(fix).await;
    let result = if accepted { "accepted" } else { "throttled" };
    state
        .metrics
        .fixes_total
        .with_label_values(&[result])
        .inc();

    if accepted {
        trigger_driver_orders(&state, id).await;
    }

    Ok(Json(FixResponse { accepted }))
}

async fn get_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DriverFix>, AppError> {
    let fix = state
        .fix_store
        .read_fix(&id)
        .ok_or_else(|| AppError::NotFound(format!("no known location for driver {}", id)))?;

    Ok(Json(fix))
}

async fn trigger_driver_orders(state: &Arc<AppState>, driver_id: Uuid) {
    let order_ids: Vec<Uuid> = state
        .orders
        .iter()
        .filter(|entry| entry.value().driver_id == Some(driver_id))
        .map(|entry| *entry.key())
        .collect();

    for order_id in order_ids {
        if let Err(err) = enqueue_trigger(state, order_id).await {
            debug!(order_id = %order_id, error = %err, "driver-move trigger failed");
        }
    }
}
