//! Kinds where at most one document may hold a boolean flag at a time, such
//! as the single active breaking news banner. See [`ItemType::exclusive_flag`].

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::ContentStore;
use crate::document::{Document, ItemType};
use crate::error::Result;

/// The document currently holding `kind`'s flag, if the kind has one.
pub async fn holder(store: &dyn ContentStore, kind: ItemType) -> Result<Option<Document>> {
    match kind.exclusive_flag() {
        Some(flag) => store.flag_holder(kind, flag).await,
        None => Ok(None),
    }
}

/// Once `doc` is stored holding its kind's flag, clear the flag on every
/// other document of that kind. Returns how many lost it.
pub async fn claim(store: &dyn ContentStore, doc: &Document, now: DateTime<Utc>) -> Result<u64> {
    let Some(flag) = doc.kind.exclusive_flag() else {
        return Ok(0);
    };
    if !doc.holds_exclusive_flag() {
        return Ok(0);
    }

    let cleared = store.clear_flag(doc.kind, flag, doc.id, now).await?;
    if cleared > 0 {
        tracing::info!(item_type = %doc.kind, id = %doc.id, flag, cleared, "exclusive flag moved");
    }
    Ok(cleared)
}

/// Drop `doc`'s flag when another document of the kind already holds it.
/// Returns whether the flag was dropped.
pub async fn yield_to_holder(store: &dyn ContentStore, doc: &mut Document) -> Result<bool> {
    let Some(flag) = doc.kind.exclusive_flag() else {
        return Ok(false);
    };
    if !doc.holds_exclusive_flag() {
        return Ok(false);
    }

    let taken = store
        .flag_holder(doc.kind, flag)
        .await?
        .is_some_and(|other| other.id != doc.id);
    if taken {
        doc.fields.insert(flag.to_string(), Value::Bool(false));
    }
    Ok(taken)
}
