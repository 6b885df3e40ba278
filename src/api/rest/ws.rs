use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::fix::DriverFix;
use crate::state::AppState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(driver_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, driver_id))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, driver_id: Uuid) {
    let (mut sender, mut receiver) = socket.split();
    let rx = state.live.subscribe(driver_id);

    state.metrics.live_subscribers.inc();
    info!(driver_id = %driver_id, "tracking subscriber connected");

    // The channel has no replay; send the stored last-known fix so a late
    // subscriber starts from the current position.
    if let Some(fix) = state.fix_store.read_fix(&driver_id) {
        if let Some(message) = encode_fix(&fix) {
            let _ = sender.send(message).await;
        }
    }

    let mut send_task = tokio::spawn(async move {
        let mut stream = BroadcastStream::new(rx);
        while let Some(Ok(fix)) = stream.next().await {
            let Some(message) = encode_fix(&fix) else {
                continue;
            };
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    // Both tasks must be done before sweeping, so the broadcast receiver
    // inside send_task has been dropped.
    let _ = send_task.await;
    let _ = recv_task.await;

    state.metrics.live_subscribers.dec();
    state.live.release_if_idle(driver_id);
    info!(driver_id = %driver_id, "tracking subscriber disconnected");
}

fn encode_fix(fix: &DriverFix) -> Option<Message> {
    match serde_json::to_string(fix) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(err) => {
            warn!(error = %err, "failed to serialize fix for ws");
            None
        }
    }
}
