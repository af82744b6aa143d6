use thiserror::Error;

use crate::database::models::UnknownVariant;

/// Postgres SQLSTATE for `unique_violation`.
pub const UNIQUE_VIOLATION: &str = "23505";
/// Postgres SQLSTATE for `foreign_key_violation`.
pub const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Persistence failures. Callers only ever match on the first three kinds;
/// everything else is reported as an internal error.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    InvalidForeignKey(String),

    #[error("Not found")]
    NotFound,

    #[error("Query error: {0}")]
    Query(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Invalid stored value: {0}")]
    Decode(#[from] UnknownVariant),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl DatabaseError {
    /// Map a driver SQLSTATE onto the taxonomy. `None` means "not a constraint we translate".
    pub fn classify(code: &str, detail: impl Into<String>) -> Option<Self> {
        match code {
            UNIQUE_VIOLATION => Some(DatabaseError::UniqueViolation(detail.into())),
            FOREIGN_KEY_VIOLATION => Some(DatabaseError::InvalidForeignKey(detail.into())),
            _ => None,
        }
    }
}

/// Single point where raw driver errors are normalized.
impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) => {
                let detail = db_err.constraint().unwrap_or_else(|| db_err.message()).to_string();
                db_err
                    .code()
                    .and_then(|code| DatabaseError::classify(&code, detail))
                    .unwrap_or_else(|| DatabaseError::Query(err.to_string()))
            }
            sqlx::Error::RowNotFound => DatabaseError::NotFound,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::Connection(err.to_string())
            }
            _ => DatabaseError::Query(err.to_string()),
        }
    }
}
