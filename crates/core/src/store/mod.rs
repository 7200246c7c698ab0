//! Storage contract shared by the PostgreSQL store and the in-memory store.

pub mod exclusive;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::document::{Document, ItemType};
use crate::error::Result;
use crate::recycle_bin::model::{
    BinFilter, BinStats, DeletedItem, DeletionStamp, PageRequest, PurgeFilter,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Persistence for live documents and recycle bin records.
///
/// Single-record writes are atomic. The two composite operations,
/// [`ContentStore::move_to_bin`] and [`ContentStore::restore_from_bin`],
/// commit both of their writes or neither.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Cheap connectivity check.
    async fn ping(&self) -> Result<()>;

    async fn get_document(&self, kind: ItemType, id: Uuid) -> Result<Option<Document>>;

    /// Newest first.
    async fn list_documents(&self, kind: ItemType, page: PageRequest) -> Result<Vec<Document>>;

    async fn count_documents(&self, kind: ItemType) -> Result<u64>;

    /// Fails with `Conflict` when the id or the `(kind, slug)` pair is taken.
    async fn insert_document(&self, doc: &Document) -> Result<()>;

    /// Replace slug, fields and `updated_at`. `NotFound` if the document is gone.
    async fn update_document(&self, doc: &Document) -> Result<()>;

    /// The most recently updated document of `kind` whose `flag` field is `true`.
    async fn flag_holder(&self, kind: ItemType, flag: &str) -> Result<Option<Document>>;

    /// Set `flag` to `false` on every other document of `kind` that holds it,
    /// stamping `updated_at`. Returns how many documents changed.
    async fn clear_flag(
        &self,
        kind: ItemType,
        flag: &str,
        keep: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64>;

    /// Remove the live document and record its snapshot in the bin.
    /// Returns `None` when no such document exists; nothing is written then.
    async fn move_to_bin(
        &self,
        kind: ItemType,
        id: Uuid,
        stamp: &DeletionStamp,
    ) -> Result<Option<DeletedItem>>;

    async fn get_deleted(&self, id: Uuid) -> Result<Option<DeletedItem>>;

    /// Most recently deleted first.
    async fn list_deleted(&self, filter: &BinFilter, page: PageRequest) -> Result<Vec<DeletedItem>>;

    async fn count_deleted(&self, filter: &BinFilter) -> Result<u64>;

    /// Claim bin record `deleted_id` and insert `doc` in its place.
    ///
    /// Returns `false` if the record no longer exists (restored, discarded or
    /// expired meanwhile). On `Conflict` the record stays in the bin.
    async fn restore_from_bin(&self, deleted_id: Uuid, doc: &Document) -> Result<bool>;

    /// Returns `false` if the record did not exist.
    async fn remove_deleted(&self, id: Uuid) -> Result<bool>;

    /// Delete every matching bin record and return the exact count.
    async fn purge_deleted(&self, filter: &PurgeFilter) -> Result<u64>;

    /// Totals and per-type breakdown; `expiring_before` bounds `expiring_soon`.
    async fn bin_stats(&self, expiring_before: DateTime<Utc>) -> Result<BinStats>;
}
