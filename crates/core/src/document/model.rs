use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::kind::ItemType;
use super::slug::slugify;
use super::validate::{validate_fields, ValidationError};

/// Keys owned by the document envelope; never stored inside `fields`.
pub const RESERVED_FIELDS: [&str; 5] = ["id", "kind", "slug", "createdAt", "updatedAt"];

/// A live entity in one of the content collections.
///
/// Serialized with its content fields flattened next to the envelope, which
/// is also the shape captured as a recycle bin snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub kind: ItemType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    /// Human-readable label (`title` or `name`, depending on the kind).
    pub fn label(&self) -> Option<&str> {
        self.fields.get(self.kind.label_field()).and_then(Value::as_str)
    }

    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Whether this document currently holds its kind's exclusive flag.
    pub fn holds_exclusive_flag(&self) -> bool {
        self.kind
            .exclusive_flag()
            .is_some_and(|flag| self.fields.get(flag) == Some(&Value::Bool(true)))
    }
}

/// Request payload for creating a live document.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub kind: ItemType,
    pub fields: Map<String, Value>,
}

impl NewDocument {
    pub fn new(kind: ItemType, fields: Map<String, Value>) -> Self {
        Self { kind, fields }
    }

    /// Assign an id and timestamps, and derive the slug from the label when
    /// the payload carries none.
    pub fn into_document(mut self, now: DateTime<Utc>) -> Result<Document, ValidationError> {
        let slug = match self.fields.remove("slug") {
            Some(Value::String(s)) => Some(slugify(&s)).filter(|s| !s.is_empty()),
            Some(Value::Null) | None => None,
            Some(_) => return Err(ValidationError::NotAString("slug".to_string())),
        };
        for key in RESERVED_FIELDS {
            self.fields.remove(key);
        }
        validate_fields(self.kind, &self.fields)?;

        let slug = slug.or_else(|| {
            self.fields
                .get(self.kind.label_field())
                .and_then(Value::as_str)
                .map(slugify)
                .filter(|s| !s.is_empty())
        });

        Ok(Document {
            id: Uuid::now_v7(),
            kind: self.kind,
            slug,
            created_at: now,
            updated_at: now,
            fields: self.fields,
        })
    }
}

/// Database row representation of a live document.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentRow {
    pub id: Uuid,
    pub kind: String,
    pub slug: Option<String>,
    pub fields: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DocumentRow> for Document {
    type Error = crate::error::CoreError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        let fields = match row.fields {
            Value::Object(map) => map,
            other => {
                return Err(crate::error::CoreError::Serialization(serde::de::Error::custom(
                    format!("document {} has non-object fields: {other}", row.id),
                )))
            }
        };
        Ok(Document {
            id: row.id,
            kind: row.kind.parse()?,
            slug: row.slug,
            created_at: row.created_at,
            updated_at: row.updated_at,
            fields,
        })
    }
}
