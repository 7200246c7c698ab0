use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::ContentStore;
use crate::document::{Document, ItemType};
use crate::error::{CoreError, Result};
use crate::recycle_bin::model::{
    BinFilter, BinStats, DeletedItem, DeletionStamp, PageRequest, PurgeFilter, TypeStats,
};

/// In-process store with the same contract as [`super::PgStore`].
///
/// Both collections sit behind one lock, so composite operations are atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

#[derive(Debug, Default)]
struct Collections {
    documents: HashMap<Uuid, Document>,
    bin: HashMap<Uuid, DeletedItem>,
}

impl Collections {
    fn check_unique(&self, doc: &Document, replacing: bool) -> Result<()> {
        if !replacing && self.documents.contains_key(&doc.id) {
            return Err(CoreError::Conflict(format!("{} {} already exists", doc.kind, doc.id)));
        }
        if let Some(slug) = &doc.slug {
            let taken = self
                .documents
                .values()
                .any(|d| d.id != doc.id && d.kind == doc.kind && d.slug.as_ref() == Some(slug));
            if taken {
                return Err(CoreError::Conflict(format!(
                    "{} slug '{slug}' is already in use",
                    doc.kind
                )));
            }
        }
        Ok(())
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn paginate<T>(items: Vec<T>, page: PageRequest) -> Vec<T> {
    items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect()
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn get_document(&self, kind: ItemType, id: Uuid) -> Result<Option<Document>> {
        let inner = self.inner.read().await;
        Ok(inner.documents.get(&id).filter(|d| d.kind == kind).cloned())
    }

    async fn list_documents(&self, kind: ItemType, page: PageRequest) -> Result<Vec<Document>> {
        let inner = self.inner.read().await;
        let mut docs: Vec<Document> = inner
            .documents
            .values()
            .filter(|d| d.kind == kind)
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(paginate(docs, page))
    }

    async fn count_documents(&self, kind: ItemType) -> Result<u64> {
        let inner = self.inner.read().await;
        Ok(inner.documents.values().filter(|d| d.kind == kind).count() as u64)
    }

    async fn insert_document(&self, doc: &Document) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.check_unique(doc, false)?;
        inner.documents.insert(doc.id, doc.clone());
        Ok(())
    }

    async fn update_document(&self, doc: &Document) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner.documents.get(&doc.id) {
            Some(existing) if existing.kind == doc.kind => {}
            _ => return Err(CoreError::not_found(doc.kind, doc.id)),
        }
        inner.check_unique(doc, true)?;
        inner.documents.insert(doc.id, doc.clone());
        Ok(())
    }

    async fn flag_holder(&self, kind: ItemType, flag: &str) -> Result<Option<Document>> {
        let inner = self.inner.read().await;
        Ok(inner
            .documents
            .values()
            .filter(|d| d.kind == kind && d.fields.get(flag) == Some(&Value::Bool(true)))
            .max_by(|a, b| a.updated_at.cmp(&b.updated_at).then(a.id.cmp(&b.id)))
            .cloned())
    }

    async fn clear_flag(
        &self,
        kind: ItemType,
        flag: &str,
        keep: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let mut cleared = 0;
        for doc in inner
            .documents
            .values_mut()
            .filter(|d| d.kind == kind && d.id != keep)
        {
            if doc.fields.get(flag) == Some(&Value::Bool(true)) {
                doc.fields.insert(flag.to_string(), Value::Bool(false));
                doc.updated_at = now;
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    async fn move_to_bin(
        &self,
        kind: ItemType,
        id: Uuid,
        stamp: &DeletionStamp,
    ) -> Result<Option<DeletedItem>> {
        let mut inner = self.inner.write().await;
        let Some(doc) = inner.documents.get(&id).filter(|d| d.kind == kind) else {
            return Ok(None);
        };
        // Capture before removing so a serialization failure leaves the document live.
        let item = DeletedItem::capture(doc, stamp)?;
        inner.documents.remove(&id);
        inner.bin.insert(item.id, item.clone());
        Ok(Some(item))
    }

    async fn get_deleted(&self, id: Uuid) -> Result<Option<DeletedItem>> {
        Ok(self.inner.read().await.bin.get(&id).cloned())
    }

    async fn list_deleted(&self, filter: &BinFilter, page: PageRequest) -> Result<Vec<DeletedItem>> {
        let inner = self.inner.read().await;
        let mut items: Vec<DeletedItem> =
            inner.bin.values().filter(|i| filter.matches(i)).cloned().collect();
        items.sort_by(|a, b| b.deleted_at.cmp(&a.deleted_at).then(b.id.cmp(&a.id)));
        Ok(paginate(items, page))
    }

    async fn count_deleted(&self, filter: &BinFilter) -> Result<u64> {
        let inner = self.inner.read().await;
        Ok(inner.bin.values().filter(|i| filter.matches(i)).count() as u64)
    }

    async fn restore_from_bin(&self, deleted_id: Uuid, doc: &Document) -> Result<bool> {
        let mut inner = self.inner.write().await;
        if !inner.bin.contains_key(&deleted_id) {
            return Ok(false);
        }
        inner.check_unique(doc, false)?;
        inner.documents.insert(doc.id, doc.clone());
        inner.bin.remove(&deleted_id);
        Ok(true)
    }

    async fn remove_deleted(&self, id: Uuid) -> Result<bool> {
        Ok(self.inner.write().await.bin.remove(&id).is_some())
    }

    async fn purge_deleted(&self, filter: &PurgeFilter) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.bin.len();
        inner.bin.retain(|_, item| !filter.matches(item));
        Ok((before - inner.bin.len()) as u64)
    }

    async fn bin_stats(&self, expiring_before: DateTime<Utc>) -> Result<BinStats> {
        let inner = self.inner.read().await;
        let mut by_type: HashMap<ItemType, TypeStats> = HashMap::new();
        let mut expiring_soon = 0;

        for item in inner.bin.values() {
            if item.expires_at <= expiring_before {
                expiring_soon += 1;
            }
            by_type
                .entry(item.item_type)
                .and_modify(|s| {
                    s.count += 1;
                    s.oldest_deleted_at = s.oldest_deleted_at.min(item.deleted_at);
                    s.newest_deleted_at = s.newest_deleted_at.max(item.deleted_at);
                })
                .or_insert(TypeStats {
                    item_type: item.item_type,
                    count: 1,
                    oldest_deleted_at: item.deleted_at,
                    newest_deleted_at: item.deleted_at,
                });
        }

        let mut by_type: Vec<TypeStats> = by_type.into_values().collect();
        by_type.sort_by_key(|s| s.item_type.as_str());

        Ok(BinStats {
            total: inner.bin.len() as u64,
            expiring_soon,
            by_type,
        })
    }
}
