use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::debug;
use uuid::Uuid;

use crate::models::fix::DriverFix;

/// Per-driver fan-out of location fixes. Bursts are debounced: only the
/// latest fix of a burst reaches subscribers once the window settles. Late
/// subscribers get no replay; callers wanting the current position fetch it
/// from the fix store explicitly.
pub struct LiveLocationChannel {
    topics: DashMap<Uuid, Topic>,
    debounce: Duration,
    buffer: usize,
}

struct Topic {
    inbound: mpsc::Sender<DriverFix>,
    outbound: broadcast::Sender<DriverFix>,
    task: JoinHandle<()>,
}

impl LiveLocationChannel {
    pub fn new(debounce: Duration, buffer: usize) -> Self {
        Self {
            topics: DashMap::new(),
            debounce,
            buffer,
        }
    }

    pub async fn publish(&self, driver_id: Uuid, fix: DriverFix) {
        let inbound = self.topic_inbound(driver_id);
        let _ = inbound.send(fix).await;
    }

    pub fn subscribe(&self, driver_id: Uuid) -> broadcast::Receiver<DriverFix> {
        self.with_topic(driver_id, |topic| topic.outbound.subscribe())
    }

    pub fn subscriber_count(&self, driver_id: Uuid) -> usize {
        self.topics
            .get(&driver_id)
            .map(|topic| topic.outbound.receiver_count())
            .unwrap_or(0)
    }

    /// Tears down a driver's topic. Safe to call when the topic was never
    /// established or was already closed.
    pub fn close(&self, driver_id: Uuid) {
        if let Some((_, topic)) = self.topics.remove(&driver_id) {
            topic.task.abort();
            debug!(driver_id = %driver_id, "live location topic closed");
        }
    }

    /// Removes a topic once its last subscriber is gone. Subscriber teardown
    /// paths call this so topics for arbitrary driver ids cannot accumulate.
    pub fn release_if_idle(&self, driver_id: Uuid) {
        if let Some((_, topic)) = self
            .topics
            .remove_if(&driver_id, |_, topic| topic.outbound.receiver_count() == 0)
        {
            topic.task.abort();
            debug!(driver_id = %driver_id, "idle live location topic removed");
        }
    }

    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    fn topic_inbound(&self, driver_id: Uuid) -> mpsc::Sender<DriverFix> {
        self.with_topic(driver_id, |topic| topic.inbound.clone())
    }

    fn with_topic<T>(&self, driver_id: Uuid, f: impl FnOnce(&Topic) -> T) -> T {
        let topic = self
            .topics
            .entry(driver_id)
            .or_insert_with(|| Topic::spawn(driver_id, self.debounce, self.buffer));
        f(topic.value())
    }
}

impl Topic {
    fn spawn(driver_id: Uuid, debounce: Duration, buffer: usize) -> Self {
        let (inbound, mut rx) = mpsc::channel::<DriverFix>(buffer);
        let (outbound, _) = broadcast::channel(buffer);
        let tx = outbound.clone();

        let task = tokio::spawn(async move {
            while let Some(mut latest) = rx.recv().await {
                // Coalesce the burst: keep replacing until the window is
                // quiet, then deliver only the newest fix.
                loop {
                    match timeout(debounce, rx.recv()).await {
                        Ok(Some(newer)) => latest = newer,
                        Ok(None) => {
                            let _ = tx.send(latest);
                            return;
                        }
                        Err(_) => break,
                    }
                }
                let _ = tx.send(latest);
            }
            debug!(driver_id = %driver_id, "live location topic drained");
        });

        Self {
            inbound,
            outbound,
            task,
        }
    }
}
