//! Repository error type shared by every data client.

use thiserror::Error;

/// Errors returned by [`DataClient`](crate::DataClient) operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database driver error that does not fit a more specific variant.
    #[error("database error: {0}")]
    Database(sqlx::Error),

    /// Stored data could not be decoded into the expected shape.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Record not found.
    #[error("record not found")]
    NotFound,

    /// The store refused the write because of a constraint (unique, foreign key, check).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The store could not be reached.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The request was malformed (bad identifier, unfiltered mutation, non-object row).
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl RepositoryError {
    /// Whether this error is the store rejecting a duplicate key.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err
            && (db.is_unique_violation() || db.is_foreign_key_violation() || db.is_check_violation())
        {
            return Self::Conflict(db.message().to_owned());
        }

        match err {
            sqlx::Error::RowNotFound => Self::NotFound,
            e @ (sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)) => {
                Self::Unavailable(e.to_string())
            }
            e @ (sqlx::Error::Decode(_) | sqlx::Error::ColumnDecode { .. }) => {
                Self::DataCorruption(e.to_string())
            }
            other => Self::Database(other),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        Self::DataCorruption(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlx_mapping() {
        assert!(matches!(
            RepositoryError::from(sqlx::Error::RowNotFound),
            RepositoryError::NotFound
        ));
        assert!(matches!(
            RepositoryError::from(sqlx::Error::PoolTimedOut),
            RepositoryError::Unavailable(_)
        ));
        assert!(matches!(
            RepositoryError::from(sqlx::Error::Protocol("bad frame".into())),
            RepositoryError::Database(_)
        ));
    }

    #[test]
    fn test_is_conflict() {
        assert!(RepositoryError::Conflict("dup".into()).is_conflict());
        assert!(!RepositoryError::NotFound.is_conflict());
    }
}
