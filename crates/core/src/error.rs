use thiserror::Error;

/// Errors produced by the store and the recycle bin services.
///
/// The variants separate "nothing happened" (`NotFound`, `InvalidType`,
/// `InvalidInput`) from "the store refused a write" (`Conflict`,
/// `StoreUnavailable`) so callers can tell whether a retry is safe.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("invalid item type: {0}")]
    InvalidType(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    pub fn not_found(what: impl std::fmt::Display, id: impl std::fmt::Display) -> Self {
        CoreError::NotFound(format!("{what} {id}"))
    }
}

/// Postgres SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => CoreError::NotFound("row".to_string()),
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                let what = db.constraint().unwrap_or("unique key").to_string();
                CoreError::Conflict(format!("duplicate value violates {what}"))
            }
            _ => CoreError::StoreUnavailable(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_errors_are_store_unavailable() {
        let err: CoreError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, CoreError::StoreUnavailable(_)));
    }

    #[test]
    fn not_found_message_names_the_target() {
        let err = CoreError::not_found("deleted item", "abc");
        assert_eq!(err.to_string(), "deleted item abc not found");
    }
}
