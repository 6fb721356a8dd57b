use rusqlite::ErrorCode;
use thiserror::Error;
use warbler_crypto::CryptoError;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    /// A write was rejected by a UNIQUE, FOREIGN KEY, CHECK or PRIMARY KEY constraint.
    #[error("integrity violation: {0}")]
    Integrity(String),

    /// A previous commit on this session failed and it has not been rolled back.
    #[error("session has a failed commit pending; roll back before reusing it")]
    RollbackRequired,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("DB lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("sqlite error: {0}")]
    Sqlite(#[source] rusqlite::Error),

    #[error(transparent)]
    Credential(#[from] CryptoError),
}

impl DbError {
    pub fn is_integrity(&self) -> bool {
        matches!(self, DbError::Integrity(_))
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(e, msg) if e.code == ErrorCode::ConstraintViolation => {
                DbError::Integrity(msg.unwrap_or_else(|| e.to_string()))
            }
            other => DbError::Sqlite(other),
        }
    }
}
