use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::model::{Document, RESERVED_FIELDS};
use super::slug::slugify;
use super::validate::{validate_fields, ValidationError};

/// Partial update of a live document: `set` merges top-level keys, `unset`
/// removes them. `slug` may be set; other envelope keys are read-only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unset: Option<Vec<String>>,
}

impl DocumentPatch {
    pub fn apply(&self, doc: &mut Document, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if let Some(keys) = &self.unset {
            for key in keys {
                if key == "slug" {
                    doc.slug = None;
                } else if RESERVED_FIELDS.contains(&key.as_str()) {
                    return Err(ValidationError::Reserved(key.clone()));
                } else {
                    doc.fields.remove(key);
                }
            }
        }

        if let Some(set) = &self.set {
            for (key, value) in set {
                if key == "slug" {
                    doc.slug = match value {
                        Value::String(s) => Some(slugify(s)).filter(|s| !s.is_empty()),
                        Value::Null => None,
                        _ => return Err(ValidationError::NotAString("slug".to_string())),
                    };
                } else if RESERVED_FIELDS.contains(&key.as_str()) {
                    return Err(ValidationError::Reserved(key.clone()));
                } else {
                    doc.fields.insert(key.clone(), value.clone());
                }
            }
        }

        validate_fields(doc.kind, &doc.fields)?;
        doc.updated_at = now;
        Ok(())
    }
}
