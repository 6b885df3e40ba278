use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::models::coordinate::Coordinate;

#[derive(Debug, Error)]
pub enum PositionError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location provider unavailable: {0}")]
    Unavailable(String),
}

/// Device location service boundary: one authoritative fix on demand, plus a
/// continuous watch stream. The receiver is the watch handle; dropping it
/// releases the watch.
#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn current_position(&self) -> Result<Coordinate, PositionError>;

    async fn watch_positions(&self) -> Result<mpsc::Receiver<Coordinate>, PositionError>;
}
