use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::document::{Document, ItemType};
use crate::error::{CoreError, Result};

/// A soft-deleted instance of exactly one live document.
///
/// Never mutated after creation; it only disappears (restore, discard,
/// empty, expiry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedItem {
    pub id: Uuid,
    pub item_type: ItemType,
    pub original_id: Uuid,
    /// Serialized [`Document`] as it was at deletion time.
    pub snapshot: Value,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub deleted_by: Uuid,
    pub deleted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl DeletedItem {
    /// Capture `doc` into a bin record stamped by `stamp`.
    pub fn capture(doc: &Document, stamp: &DeletionStamp) -> Result<Self> {
        let snapshot = serde_json::to_value(doc)?;
        let title = doc
            .label()
            .map(str::to_string)
            .or_else(|| doc.slug.clone())
            .unwrap_or_else(|| doc.id.to_string());

        Ok(Self {
            id: Uuid::now_v7(),
            item_type: doc.kind,
            original_id: doc.id,
            snapshot,
            title,
            slug: doc.slug.clone(),
            deleted_by: stamp.deleted_by,
            deleted_at: stamp.deleted_at,
            expires_at: stamp.expires_at,
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Whole days left before the sweeper may remove this record.
    pub fn days_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_days().max(0)
    }
}

/// Who deleted and when, plus the derived expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletionStamp {
    pub deleted_by: Uuid,
    pub deleted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// How long a bin record survives before the sweeper removes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    days: u32,
}

impl RetentionPolicy {
    pub const DEFAULT_DAYS: u32 = 30;
    /// Ten years.
    pub const MAX_DAYS: u32 = 3650;

    /// A zero-day window would break `expires_at > deleted_at`.
    pub fn days(days: u32) -> Result<Self> {
        if days == 0 {
            return Err(CoreError::InvalidInput(
                "retention window must be at least one day".to_string(),
            ));
        }
        if days > Self::MAX_DAYS {
            return Err(CoreError::InvalidInput(format!(
                "retention window must not exceed {} days",
                Self::MAX_DAYS
            )));
        }
        Ok(Self { days })
    }

    pub fn window(&self) -> Duration {
        Duration::days(i64::from(self.days))
    }

    /// Fails with `InvalidInput` when the expiry falls outside the
    /// representable date range.
    pub fn stamp(&self, deleted_by: Uuid, deleted_at: DateTime<Utc>) -> Result<DeletionStamp> {
        let expires_at = deleted_at.checked_add_signed(self.window()).ok_or_else(|| {
            CoreError::InvalidInput(format!("expiry of a deletion at {deleted_at} is out of range"))
        })?;
        Ok(DeletionStamp {
            deleted_by,
            deleted_at,
            expires_at,
        })
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            days: Self::DEFAULT_DAYS,
        }
    }
}

/// Listing filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinFilter {
    pub item_type: Option<ItemType>,
    pub deleted_by: Option<Uuid>,
}

impl BinFilter {
    pub fn matches(&self, item: &DeletedItem) -> bool {
        self.item_type.map_or(true, |t| t == item.item_type)
            && self.deleted_by.map_or(true, |u| u == item.deleted_by)
    }
}

/// Bulk removal filter. `expired_before` restricts to records whose
/// `expires_at` is at or before the given instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeFilter {
    pub item_type: Option<ItemType>,
    pub expired_before: Option<DateTime<Utc>>,
}

impl PurgeFilter {
    pub fn matches(&self, item: &DeletedItem) -> bool {
        self.item_type.map_or(true, |t| t == item.item_type)
            && self.expired_before.map_or(true, |at| item.expires_at <= at)
    }
}

/// Bulk empty request: optional kind, optionally only records already expired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmptyRequest {
    pub item_type: Option<ItemType>,
    pub expired_only: bool,
}

/// One-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub const DEFAULT_SIZE: u32 = 20;
    pub const MAX_SIZE: u32 = 100;

    /// Validate and clamp: both values must be at least 1, the size is capped.
    pub fn new(page: u32, page_size: u32) -> Result<Self> {
        if page == 0 {
            return Err(CoreError::InvalidInput("page must be at least 1".to_string()));
        }
        if page_size == 0 {
            return Err(CoreError::InvalidInput("limit must be at least 1".to_string()));
        }
        Ok(Self {
            page,
            page_size: page_size.min(Self::MAX_SIZE),
        })
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: Self::DEFAULT_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u64,
    pub total_items: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(req: PageRequest, total_items: u64) -> Self {
        let total_pages = total_items.div_ceil(u64::from(req.page_size));
        Self {
            current_page: req.page,
            total_pages,
            total_items,
            has_next_page: u64::from(req.page) < total_pages,
            has_prev_page: req.page > 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// Per-type breakdown in [`BinStats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeStats {
    pub item_type: ItemType,
    pub count: u64,
    pub oldest_deleted_at: DateTime<Utc>,
    pub newest_deleted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BinStats {
    pub total: u64,
    pub expiring_soon: u64,
    pub by_type: Vec<TypeStats>,
}

/// Database row representation of a bin record.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DeletedItemRow {
    pub id: Uuid,
    pub item_type: String,
    pub original_id: Uuid,
    pub snapshot: Value,
    pub title: String,
    pub slug: Option<String>,
    pub deleted_by: Uuid,
    pub deleted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TryFrom<DeletedItemRow> for DeletedItem {
    type Error = CoreError;

    fn try_from(row: DeletedItemRow) -> Result<Self> {
        Ok(DeletedItem {
            id: row.id,
            item_type: row.item_type.parse()?,
            original_id: row.original_id,
            snapshot: row.snapshot,
            title: row.title,
            slug: row.slug,
            deleted_by: row.deleted_by,
            deleted_at: row.deleted_at,
            expires_at: row.expires_at,
        })
    }
}
