use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::model::DeletedItem;
use crate::document::{Document, ItemType};
use crate::error::{CoreError, Result};

/// Rebuilds a live document from a bin snapshot.
///
/// Implementations start from [`document_from_snapshot`] and then apply the
/// kind's own rules. Any `Fn(&DeletedItem, DateTime<Utc>) -> Result<Document>`
/// is a reconstructor.
pub trait Reconstructor: Send + Sync {
    fn reconstruct(&self, item: &DeletedItem, now: DateTime<Utc>) -> Result<Document>;
}

impl<F> Reconstructor for F
where
    F: Fn(&DeletedItem, DateTime<Utc>) -> Result<Document> + Send + Sync,
{
    fn reconstruct(&self, item: &DeletedItem, now: DateTime<Utc>) -> Result<Document> {
        self(item, now)
    }
}

/// Common rule: original id and kind, original `createdAt`, fresh `updatedAt`,
/// every content field as captured.
pub fn document_from_snapshot(item: &DeletedItem, now: DateTime<Utc>) -> Result<Document> {
    let mut doc: Document = serde_json::from_value(item.snapshot.clone())?;
    doc.id = item.original_id;
    doc.kind = item.item_type;
    doc.updated_at = now;
    Ok(doc)
}

/// A scheduled article whose slot already passed comes back as a draft, so a
/// restore never publishes anything.
pub fn restore_article(item: &DeletedItem, now: DateTime<Utc>) -> Result<Document> {
    let mut doc = document_from_snapshot(item, now)?;
    if doc.field_str("status") == Some("scheduled") {
        let still_ahead = doc
            .field_str("scheduledFor")
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .is_some_and(|at| at.with_timezone(&Utc) > now);
        if !still_ahead {
            doc.fields
                .insert("status".to_string(), Value::String("draft".to_string()));
        }
    }
    Ok(doc)
}

/// Maps each soft-deletable kind to its reconstructor.
#[derive(Clone)]
pub struct RestoreRegistry {
    handlers: HashMap<ItemType, Arc<dyn Reconstructor>>,
}

impl RestoreRegistry {
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registry covering every [`ItemType`].
    pub fn standard() -> Self {
        Self::empty()
            .with(ItemType::Article, restore_article)
            .with(ItemType::Category, document_from_snapshot)
            .with(ItemType::Author, document_from_snapshot)
            .with(ItemType::StaticPage, document_from_snapshot)
            .with(ItemType::BreakingNews, document_from_snapshot)
            .with(ItemType::Tag, document_from_snapshot)
    }

    pub fn with(mut self, kind: ItemType, handler: impl Reconstructor + 'static) -> Self {
        self.register(kind, handler);
        self
    }

    pub fn register(&mut self, kind: ItemType, handler: impl Reconstructor + 'static) {
        self.handlers.insert(kind, Arc::new(handler));
    }

    pub fn supports(&self, kind: ItemType) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Fails with `InvalidType` when the kind has no registered handler; that
    /// is a wiring defect, not a data condition.
    pub fn reconstruct(&self, item: &DeletedItem, now: DateTime<Utc>) -> Result<Document> {
        let handler = self.handlers.get(&item.item_type).ok_or_else(|| {
            tracing::error!(item_type = %item.item_type, id = %item.id, "no reconstructor registered");
            CoreError::InvalidType(format!("no reconstructor registered for {}", item.item_type))
        })?;
        handler.reconstruct(item, now)
    }
}

impl Default for RestoreRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for RestoreRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&ItemType> = self.handlers.keys().collect();
        kinds.sort();
        f.debug_struct("RestoreRegistry").field("kinds", &kinds).finish()
    }
}
