use std::sync::Arc;

use uuid::Uuid;

use super::model::{DeletedItem, RetentionPolicy};
use crate::clock::{Clock, SystemClock};
use crate::document::ItemType;
use crate::error::{CoreError, Result};
use crate::events::{ContentEvent, EventBus};
use crate::store::ContentStore;

/// Turns "delete this document" into "move it to the recycle bin".
///
/// The snapshot insert and the live delete are one store transaction, so a
/// failure can neither lose the document nor leave a backup of a document
/// that still exists.
#[derive(Clone)]
pub struct SoftDeleteDispatcher {
    store: Arc<dyn ContentStore>,
    retention: RetentionPolicy,
    clock: Arc<dyn Clock>,
    events: EventBus,
}

impl SoftDeleteDispatcher {
    pub fn new(store: Arc<dyn ContentStore>, retention: RetentionPolicy, events: EventBus) -> Self {
        Self {
            store,
            retention,
            clock: Arc::new(SystemClock),
            events,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    /// Soft-delete document `id` of `kind` on behalf of `deleted_by`.
    ///
    /// Returns `NotFound` without touching the bin when the document does not
    /// exist. Store failures are returned as-is and never retried here.
    pub async fn soft_delete(&self, kind: ItemType, id: Uuid, deleted_by: Uuid) -> Result<DeletedItem> {
        let stamp = self.retention.stamp(deleted_by, self.clock.now())?;

        let item = self
            .store
            .move_to_bin(kind, id, &stamp)
            .await?
            .ok_or_else(|| CoreError::not_found(kind, id))?;

        tracing::info!(
            item_type = %kind,
            original_id = %id,
            deleted_item_id = %item.id,
            deleted_by = %deleted_by,
            expires_at = %item.expires_at,
            "moved to recycle bin"
        );

        self.events.emit(ContentEvent::Deleted {
            item_type: kind,
            original_id: id,
            deleted_item_id: item.id,
            deleted_by,
            timestamp: item.deleted_at,
        });

        Ok(item)
    }
}
