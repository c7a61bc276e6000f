//! SQLite storage bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the ledger.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Ledger code must not read/write accounts or records before migrations succeed.
//! - Lock-wait timeouts and interrupts are distinguishable from other SQLite failures.

use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, open_db_with_timeout, DEFAULT_BUSY_TIMEOUT};

pub type DbResult<T> = Result<T, DbError>;

/// Storage failure, split by what the ledger can do about it.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Writer lock not acquired within the busy timeout.
    Busy(rusqlite::Error),
    /// Statement aborted through an interrupt handle; its scope is rolled back.
    Interrupted(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl DbError {
    /// Short code for the `error_code` log field.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite_error",
            Self::Busy(_) => "lock_timeout",
            Self::Interrupted(_) => "interrupted",
            Self::UnsupportedSchemaVersion { .. } => "unsupported_schema_version",
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Busy(err) => write!(f, "ledger database is locked: {err}"),
            Self::Interrupted(err) => write!(f, "ledger operation interrupted: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "ledger schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Busy(err) | Self::Interrupted(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        let code = match &value {
            rusqlite::Error::SqliteFailure(failure, _) => Some(failure.code),
            _ => None,
        };
        match code {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => Self::Busy(value),
            Some(ErrorCode::OperationInterrupted) => Self::Interrupted(value),
            _ => Self::Sqlite(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DbError;
    use rusqlite::ffi;

    fn failure(code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(ffi::Error::new(code), None)
    }

    #[test]
    fn contention_and_interrupts_get_their_own_codes() {
        assert_eq!(DbError::from(failure(ffi::SQLITE_BUSY)).code(), "lock_timeout");
        assert_eq!(DbError::from(failure(ffi::SQLITE_LOCKED)).code(), "lock_timeout");
        assert_eq!(
            DbError::from(failure(ffi::SQLITE_INTERRUPT)).code(),
            "interrupted"
        );
        assert_eq!(
            DbError::from(failure(ffi::SQLITE_CONSTRAINT)).code(),
            "sqlite_error"
        );
        assert_eq!(
            DbError::from(rusqlite::Error::QueryReturnedNoRows).code(),
            "sqlite_error"
        );
    }
}
