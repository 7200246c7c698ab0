use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use super::model::PurgeFilter;
use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::events::{ContentEvent, EventBus, PurgeReason};
use crate::store::ContentStore;

/// Periodically removes bin records whose `expires_at` has passed.
///
/// Expiry is best-effort: a record can outlive its deadline by up to one
/// interval, and a restore that loses the race gets `NotFound`.
#[derive(Clone)]
pub struct ExpirySweeper {
    store: Arc<dyn ContentStore>,
    clock: Arc<dyn Clock>,
    events: EventBus,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(store: Arc<dyn ContentStore>, events: EventBus, interval: Duration) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            events,
            interval,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// One pass: delete everything expired as of now.
    pub async fn sweep(&self) -> Result<u64> {
        let now = self.clock.now();
        let filter = PurgeFilter {
            item_type: None,
            expired_before: Some(now),
        };
        let count = self.store.purge_deleted(&filter).await?;

        if count > 0 {
            tracing::info!(count, "expired recycle bin records removed");
            self.events.emit(ContentEvent::Purged {
                item_type: None,
                count,
                reason: PurgeReason::Expired,
                timestamp: now,
            });
        } else {
            tracing::debug!("no expired recycle bin records");
        }
        Ok(count)
    }

    /// Sweep on every tick until `shutdown` flips to `true` or its sender drops.
    /// A failed pass is logged and retried on the next tick.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(interval_secs = self.interval.as_secs(), "expiry sweeper started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(err) = self.sweep().await {
                        tracing::error!(error = %err, "expiry sweep failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!("expiry sweeper stopped");
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
