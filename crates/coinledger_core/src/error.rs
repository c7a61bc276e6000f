//! Public error taxonomy of the ledger.
//!
//! # Invariants
//! - Every failure surfaced by the engine, projector or authenticator is one
//!   of the kinds below; callers never see raw SQLite errors.
//! - `StorageFailure` is the only kind that may hide an ambiguous commit.

use crate::db::DbError;
use crate::repo::account_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors returned by ledger use-cases.
#[derive(Debug)]
pub enum LedgerError {
    /// Malformed request (non-positive amount, blank item, bad username).
    InvalidInput(String),
    /// Unknown counterparty, caller or item.
    NotFound { entity: &'static str, key: String },
    /// Username already registered.
    AlreadyExists(String),
    /// Transfer destination resolved to the caller.
    SelfTransfer,
    InsufficientFunds { balance: i64, required: i64 },
    /// Catalog row with a non-positive price.
    InvalidItem { name: String, price: i64 },
    /// Credential or identity assertion rejected.
    Unauthorized(String),
    /// Persistence failure; the operation must be treated as not applied.
    StorageFailure(RepoError),
    /// Failure outside storage (hashing, signing, clock).
    Internal(String),
}

/// Stable, payload-free discriminant of [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerErrorKind {
    InvalidInput,
    NotFound,
    AlreadyExists,
    SelfTransfer,
    InsufficientFunds,
    InvalidItem,
    Unauthorized,
    StorageFailure,
    Internal,
}

impl LedgerErrorKind {
    /// Snake-case code used in log lines and CLI output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::SelfTransfer => "self_transfer",
            Self::InsufficientFunds => "insufficient_funds",
            Self::InvalidItem => "invalid_item",
            Self::Unauthorized => "unauthorized",
            Self::StorageFailure => "storage_failure",
            Self::Internal => "internal",
        }
    }
}

impl LedgerError {
    pub fn kind(&self) -> LedgerErrorKind {
        match self {
            Self::InvalidInput(_) => LedgerErrorKind::InvalidInput,
            Self::NotFound { .. } => LedgerErrorKind::NotFound,
            Self::AlreadyExists(_) => LedgerErrorKind::AlreadyExists,
            Self::SelfTransfer => LedgerErrorKind::SelfTransfer,
            Self::InsufficientFunds { .. } => LedgerErrorKind::InsufficientFunds,
            Self::InvalidItem { .. } => LedgerErrorKind::InvalidItem,
            Self::Unauthorized(_) => LedgerErrorKind::Unauthorized,
            Self::StorageFailure(_) => LedgerErrorKind::StorageFailure,
            Self::Internal(_) => LedgerErrorKind::Internal,
        }
    }

    /// HTTP status class a front-end should answer with.
    ///
    /// Client-caused failures map to 400, rejected identity to 401, and
    /// storage or internal failures to 500.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            LedgerErrorKind::Unauthorized => 401,
            LedgerErrorKind::StorageFailure | LedgerErrorKind::Internal => 500,
            _ => 400,
        }
    }

    /// Code for the `error_code` log field.
    ///
    /// Storage failures report the underlying database code (`lock_timeout`,
    /// `interrupted`, ...); every other error reports its kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::StorageFailure(RepoError::Db(err)) => err.code(),
            other => other.kind().as_str(),
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

impl Display for LedgerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::NotFound { entity, key } => write!(f, "{entity} not found: {key}"),
            Self::AlreadyExists(username) => write!(f, "account already exists: {username}"),
            Self::SelfTransfer => write!(f, "cannot transfer coins to yourself"),
            Self::InsufficientFunds { balance, required } => write!(
                f,
                "insufficient funds: balance {balance}, required {required}"
            ),
            Self::InvalidItem { name, price } => {
                write!(f, "item `{name}` is not purchasable at price {price}")
            }
            Self::Unauthorized(reason) => write!(f, "unauthorized: {reason}"),
            Self::StorageFailure(err) => write!(f, "storage failure: {err}"),
            Self::Internal(message) => write!(f, "internal failure: {message}"),
        }
    }
}

impl Error for LedgerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StorageFailure(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for LedgerError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, key } => Self::NotFound { entity, key },
            RepoError::AlreadyExists { key, .. } => Self::AlreadyExists(key),
            other => Self::StorageFailure(other),
        }
    }
}

impl From<DbError> for LedgerError {
    fn from(value: DbError) -> Self {
        Self::StorageFailure(RepoError::Db(value))
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(value: rusqlite::Error) -> Self {
        Self::StorageFailure(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::{LedgerError, LedgerErrorKind};
    use crate::repo::account_repo::RepoError;

    #[test]
    fn status_codes_follow_error_class() {
        assert_eq!(LedgerError::SelfTransfer.status_code(), 400);
        assert_eq!(
            LedgerError::InsufficientFunds {
                balance: 1,
                required: 2
            }
            .status_code(),
            400
        );
        assert_eq!(
            LedgerError::Unauthorized("bad token".to_string()).status_code(),
            401
        );
        assert_eq!(
            LedgerError::StorageFailure(RepoError::Misuse("x")).status_code(),
            500
        );
    }

    #[test]
    fn repo_not_found_keeps_its_kind() {
        let err = LedgerError::from(RepoError::NotFound {
            entity: "item",
            key: "hat".to_string(),
        });
        assert_eq!(err.kind(), LedgerErrorKind::NotFound);
        assert_eq!(err.to_string(), "item not found: hat");
    }

    #[test]
    fn repo_misuse_becomes_storage_failure() {
        let err = LedgerError::from(RepoError::Misuse("no tx"));
        assert_eq!(err.kind(), LedgerErrorKind::StorageFailure);
        assert_eq!(err.error_code(), "storage_failure");
    }

    #[test]
    fn busy_storage_failure_reports_lock_timeout_code() {
        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        let err = LedgerError::from(busy);
        assert_eq!(err.kind(), LedgerErrorKind::StorageFailure);
        assert_eq!(err.error_code(), "lock_timeout");
        assert_eq!(LedgerError::SelfTransfer.error_code(), "self_transfer");
    }
}
