use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use super::model::{BinFilter, BinStats, DeletedItem, EmptyRequest, Page, PageRequest, Pagination, PurgeFilter};
use super::restore::RestoreRegistry;
use crate::clock::{Clock, SystemClock};
use crate::document::Document;
use crate::error::{CoreError, Result};
use crate::events::{ContentEvent, EventBus, PurgeReason};
use crate::store::{exclusive, ContentStore};

/// Records expiring within this window count as "expiring soon" in stats.
const EXPIRING_SOON_DAYS: i64 = 7;

/// Administrator-facing recycle bin operations: browse, restore, discard, empty.
#[derive(Clone)]
pub struct RecycleBinService {
    store: Arc<dyn ContentStore>,
    registry: Arc<RestoreRegistry>,
    clock: Arc<dyn Clock>,
    events: EventBus,
}

impl RecycleBinService {
    pub fn new(store: Arc<dyn ContentStore>, registry: RestoreRegistry, events: EventBus) -> Self {
        Self {
            store,
            registry: Arc::new(registry),
            clock: Arc::new(SystemClock),
            events,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Matching records, most recently deleted first.
    pub async fn list(&self, filter: BinFilter, page: PageRequest) -> Result<Page<DeletedItem>> {
        let items = self.store.list_deleted(&filter, page).await?;
        let total = self.store.count_deleted(&filter).await?;
        Ok(Page {
            items,
            pagination: Pagination::new(page, total),
        })
    }

    pub async fn get(&self, id: Uuid) -> Result<DeletedItem> {
        self.store
            .get_deleted(id)
            .await?
            .ok_or_else(|| CoreError::not_found("deleted item", id))
    }

    pub async fn stats(&self) -> Result<BinStats> {
        let horizon = self.clock.now() + Duration::days(EXPIRING_SOON_DAYS);
        self.store.bin_stats(horizon).await
    }

    /// Put the record's document back into its collection and drop the record.
    ///
    /// Either both happen or neither: `Conflict` leaves the record in the bin
    /// so it can be retried once the clash is resolved. A record that vanished
    /// meanwhile (concurrent restore, discard, expiry) yields `NotFound`.
    /// A document that held its kind's exclusive flag comes back without it
    /// when another document took the flag in the meantime.
    pub async fn restore(&self, id: Uuid) -> Result<Document> {
        let item = self.get(id).await?;
        let now = self.clock.now();
        let mut doc = self.registry.reconstruct(&item, now)?;
        if exclusive::yield_to_holder(self.store.as_ref(), &mut doc).await? {
            tracing::info!(
                deleted_item_id = %id,
                item_type = %item.item_type,
                "restored without exclusive flag, another document holds it"
            );
        }

        match self.store.restore_from_bin(id, &doc).await {
            Ok(true) => {}
            Ok(false) => return Err(CoreError::not_found("deleted item", id)),
            Err(err @ CoreError::Conflict(_)) => {
                tracing::warn!(
                    deleted_item_id = %id,
                    item_type = %item.item_type,
                    original_id = %item.original_id,
                    error = %err,
                    "restore blocked by existing document"
                );
                return Err(err);
            }
            Err(err) => return Err(err),
        }

        tracing::info!(
            deleted_item_id = %id,
            item_type = %item.item_type,
            original_id = %item.original_id,
            "restored from recycle bin"
        );

        self.events.emit(ContentEvent::Restored {
            item_type: item.item_type,
            original_id: item.original_id,
            deleted_item_id: id,
            timestamp: now,
        });

        Ok(doc)
    }

    /// Discard one record. Repeating the call after success yields `NotFound`.
    pub async fn permanently_delete(&self, id: Uuid) -> Result<()> {
        if !self.store.remove_deleted(id).await? {
            return Err(CoreError::not_found("deleted item", id));
        }

        tracing::info!(deleted_item_id = %id, "permanently deleted from recycle bin");
        self.events.emit(ContentEvent::Purged {
            item_type: None,
            count: 1,
            reason: PurgeReason::Discarded,
            timestamp: self.clock.now(),
        });
        Ok(())
    }

    /// Bulk removal, optionally limited to one kind and/or to expired records.
    /// Returns the exact number of records removed.
    pub async fn empty(&self, request: EmptyRequest) -> Result<u64> {
        let now = self.clock.now();
        let filter = PurgeFilter {
            item_type: request.item_type,
            expired_before: request.expired_only.then_some(now),
        };
        let count = self.store.purge_deleted(&filter).await?;

        tracing::info!(
            item_type = ?request.item_type,
            expired_only = request.expired_only,
            count,
            "emptied recycle bin"
        );
        self.events.emit(ContentEvent::Purged {
            item_type: request.item_type,
            count,
            reason: PurgeReason::Emptied,
            timestamp: now,
        });
        Ok(count)
    }
}
