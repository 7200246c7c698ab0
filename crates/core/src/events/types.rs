use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::ItemType;

/// Events emitted after a successful write, one per document or bin change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentEvent {
    #[serde(rename_all = "camelCase")]
    Created {
        item_type: ItemType,
        id: Uuid,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    Updated {
        item_type: ItemType,
        id: Uuid,
        timestamp: DateTime<Utc>,
    },
    /// A live document moved into the recycle bin.
    #[serde(rename_all = "camelCase")]
    Deleted {
        item_type: ItemType,
        original_id: Uuid,
        deleted_item_id: Uuid,
        deleted_by: Uuid,
        timestamp: DateTime<Utc>,
    },
    /// A bin record was turned back into a live document. Subscribers must
    /// not treat this as a fresh publication.
    #[serde(rename_all = "camelCase")]
    Restored {
        item_type: ItemType,
        original_id: Uuid,
        deleted_item_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    /// Bin records removed for good.
    #[serde(rename_all = "camelCase")]
    Purged {
        item_type: Option<ItemType>,
        count: u64,
        reason: PurgeReason,
        timestamp: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PurgeReason {
    /// Single record removed by an administrator.
    Discarded,
    /// Bulk empty requested by an administrator.
    Emptied,
    /// Retention window elapsed.
    Expired,
}
