use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::fix::{DriverFix, FixSource};
use crate::store::FixStore;
use crate::tracking::channel::LiveLocationChannel;
use crate::tracking::source::{PositionError, PositionSource};
use crate::tracking::tracker::LocationTracker;

/// Owns everything tied to one driver's live session: the threshold tracker,
/// the optional device watch task, and the store/channel handles. One
/// teardown path serves both explicit stop and screen unmount.
pub struct TrackingSession {
    driver_id: Uuid,
    tracker: Mutex<LocationTracker>,
    store: Arc<FixStore>,
    live: Arc<LiveLocationChannel>,
    online: AtomicBool,
    watch_task: Mutex<Option<JoinHandle<()>>>,
}

impl TrackingSession {
    pub fn new(
        driver_id: Uuid,
        min_distance_m: f64,
        min_interval_secs: i64,
        store: Arc<FixStore>,
        live: Arc<LiveLocationChannel>,
    ) -> Arc<Self> {
        Arc::new(Self {
            driver_id,
            tracker: Mutex::new(LocationTracker::new(min_distance_m, min_interval_secs)),
            store,
            live,
            online: AtomicBool::new(true),
            watch_task: Mutex::new(None),
        })
    }

    pub fn driver_id(&self) -> Uuid {
        self.driver_id
    }

    /// Runs a fix through the threshold gate; accepted fixes update the
    /// local last-known immediately and, while the driver is online,
    /// replicate to the shared store and fan out to subscribers. Local
    /// readers never wait on replication.
    pub async fn ingest(&self, fix: DriverFix) -> bool {
        let accepted = {
            let mut tracker = self.tracker.lock().await;
            tracker.offer(fix)
        };

        let Some(fix) = accepted else {
            return false;
        };

        if self.online.load(Ordering::Acquire) {
            self.store.write_fix(self.driver_id, fix);
            self.live.publish(self.driver_id, fix).await;
        }

        true
    }

    /// Acquires the one-shot fix, then opens the continuous watch. A
    /// permission denial aborts the start; tracking never proceeds without
    /// a granted permission.
    pub async fn start_with_source(
        self: &Arc<Self>,
        source: Arc<dyn PositionSource>,
    ) -> Result<(), PositionError> {
        let first = source.current_position().await?;
        self.ingest(DriverFix::now(first, FixSource::OneShot)).await;

        let mut positions = source.watch_positions().await?;
        let session = self.clone();
        let handle = tokio::spawn(async move {
            while let Some(coordinate) = positions.recv().await {
                session
                    .ingest(DriverFix::now(coordinate, FixSource::Watch))
                    .await;
            }
            debug!(driver_id = %session.driver_id, "position watch ended");
        });

        *self.watch_task.lock().await = Some(handle);
        info!(driver_id = %self.driver_id, "tracking session started");
        Ok(())
    }

    pub async fn last_known(&self) -> Option<DriverFix> {
        self.tracker.lock().await.last_known()
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    /// Idempotent teardown: releases the watch exactly once, stops the
    /// tracker, and closes the live topic. The last persisted fix remains
    /// readable from the store.
    pub async fn stop(&self) {
        let was_online = self.online.swap(false, Ordering::AcqRel);

        if let Some(handle) = self.watch_task.lock().await.take() {
            handle.abort();
        }

        self.tracker.lock().await.stop();
        self.live.close(self.driver_id);

        if was_online {
            info!(driver_id = %self.driver_id, "tracking session stopped");
        }
    }
}
