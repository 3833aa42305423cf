//! Failure taxonomy for catalog operations.
//!
//! Storage-engine errors never cross the catalog boundary as-is; they are
//! classified into [`CatalogError`] at a single conversion point.

use std::path::PathBuf;

use rusqlite::ErrorCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Coarse failure kind, for callers that map failures to user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Constraint,
    NotFound,
    Schema,
    Io,
    Query,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    /// Uniqueness or referential violation (duplicate path, duplicate tag name).
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// An association referenced a tag, item or collection that does not exist.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("schema error: {0}")]
    Schema(String),

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("query failed: {0}")]
    Query(#[source] rusqlite::Error),
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::Constraint(_) => ErrorKind::Constraint,
            CatalogError::NotFound { .. } => ErrorKind::NotFound,
            CatalogError::Schema(_) => ErrorKind::Schema,
            CatalogError::Io { .. } => ErrorKind::Io,
            CatalogError::Query(_) => ErrorKind::Query,
        }
    }

    pub(crate) fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        CatalogError::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CatalogError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<rusqlite::Error> for CatalogError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref failure, ref message)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                CatalogError::Constraint(
                    message.clone().unwrap_or_else(|| failure.to_string()),
                )
            }
            other => CatalogError::Query(other),
        }
    }
}
