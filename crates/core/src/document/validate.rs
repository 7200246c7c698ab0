/// Required-field checks applied before a document is written.
use serde_json::{Map, Value};
use thiserror::Error;

use super::kind::ItemType;
use crate::error::CoreError;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{kind} requires a `{field}` field")]
    MissingLabel { kind: ItemType, field: &'static str },
    #[error("`{0}` cannot be empty")]
    EmptyLabel(&'static str),
    #[error("`{0}` must be a string")]
    NotAString(String),
    #[error("`{0}` is managed by the server and cannot be changed")]
    Reserved(String),
}

impl From<ValidationError> for CoreError {
    fn from(err: ValidationError) -> Self {
        CoreError::InvalidInput(err.to_string())
    }
}

/// Validate that the content fields carry the kind's label.
pub fn validate_fields(kind: ItemType, fields: &Map<String, Value>) -> Result<(), ValidationError> {
    let field = kind.label_field();
    match fields.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingLabel { kind, field }),
        Some(Value::String(s)) if s.trim().is_empty() => Err(ValidationError::EmptyLabel(field)),
        Some(Value::String(_)) => Ok(()),
        Some(_) => Err(ValidationError::NotAString(field.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn article_needs_title() {
        let fields = json!({"name": "x"}).as_object().cloned().unwrap();
        let err = validate_fields(ItemType::Article, &fields).unwrap_err();
        assert!(matches!(err, ValidationError::MissingLabel { field: "title", .. }));
    }

    #[test]
    fn blank_label_rejected() {
        let fields = json!({"name": "   "}).as_object().cloned().unwrap();
        assert!(matches!(
            validate_fields(ItemType::Author, &fields),
            Err(ValidationError::EmptyLabel("name"))
        ));
    }

    #[test]
    fn non_string_label_rejected() {
        let fields = json!({"name": 7}).as_object().cloned().unwrap();
        assert!(validate_fields(ItemType::Tag, &fields).is_err());
    }
}
