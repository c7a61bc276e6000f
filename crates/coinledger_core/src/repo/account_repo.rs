//! Account Store contract and SQLite implementation.
//!
//! # Responsibility
//! - Create and look up accounts.
//! - Provide the exclusive-lock read and atomic balance arithmetic the ledger
//!   engine composes inside its transaction scope.
//!
//! # Invariants
//! - Username uniqueness is enforced by the `accounts.username` constraint.
//! - `lock_for_update` is only valid inside an open transaction.
//! - Balance updates are single-statement arithmetic, never read-modify-write.

use crate::db::DbError;
use crate::model::account::{Account, AccountId, INITIAL_BALANCE};
use rusqlite::{ffi, params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ACCOUNT_SELECT_SQL: &str = "SELECT
    id,
    username,
    password_hash,
    balance,
    created_at
FROM accounts";

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for ledger persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound { entity: &'static str, key: String },
    AlreadyExists { entity: &'static str, key: String },
    /// API used outside the transaction scope it requires.
    Misuse(&'static str),
    InvalidData(String),
}

impl RepoError {
    pub(crate) fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, key } => write!(f, "{entity} not found: {key}"),
            Self::AlreadyExists { entity, key } => write!(f, "{entity} already exists: {key}"),
            Self::Misuse(message) => write!(f, "repository misuse: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted ledger data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::from(value))
    }
}

/// Repository interface for the Account Store.
pub trait AccountRepository {
    /// Creates an account with the initial coin grant.
    fn create_account(&self, username: &str, password_hash: &str) -> RepoResult<Account>;
    fn get_by_username(&self, username: &str) -> RepoResult<Account>;
    fn get_by_id(&self, id: AccountId) -> RepoResult<Account>;
    /// Takes the write lock covering `id` and returns its current balance.
    fn lock_for_update(&self, id: AccountId) -> RepoResult<i64>;
    fn debit(&self, id: AccountId, amount: i64) -> RepoResult<()>;
    fn credit(&self, id: AccountId, amount: i64) -> RepoResult<()>;
}

/// SQLite-backed Account Store.
///
/// Built over a plain connection for reads, or over a `Transaction` (via
/// deref) when used by the ledger engine.
pub struct SqliteAccountRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAccountRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AccountRepository for SqliteAccountRepository<'_> {
    fn create_account(&self, username: &str, password_hash: &str) -> RepoResult<Account> {
        let inserted = self.conn.execute(
            "INSERT INTO accounts (username, password_hash, balance) VALUES (?1, ?2, ?3);",
            params![username, password_hash, INITIAL_BALANCE],
        );

        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(RepoError::AlreadyExists {
                    entity: "account",
                    key: username.to_string(),
                });
            }
            Err(err) => return Err(err.into()),
        }

        self.get_by_id(self.conn.last_insert_rowid())
    }

    fn get_by_username(&self, username: &str) -> RepoResult<Account> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ACCOUNT_SELECT_SQL} WHERE username = ?1;"))?;
        let mut rows = stmt.query([username])?;
        match rows.next()? {
            Some(row) => parse_account_row(row),
            None => Err(RepoError::not_found("account", username)),
        }
    }

    fn get_by_id(&self, id: AccountId) -> RepoResult<Account> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ACCOUNT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => parse_account_row(row),
            None => Err(RepoError::not_found("account", id)),
        }
    }

    fn lock_for_update(&self, id: AccountId) -> RepoResult<i64> {
        if self.conn.is_autocommit() {
            return Err(RepoError::Misuse(
                "lock_for_update requires an open transaction",
            ));
        }

        // A no-op write takes the writer lock even in a deferred transaction,
        // and RETURNING reads the balance under that same lock.
        let balance = self
            .conn
            .query_row(
                "UPDATE accounts SET balance = balance WHERE id = ?1 RETURNING balance;",
                [id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        balance.ok_or_else(|| RepoError::not_found("account", id))
    }

    fn debit(&self, id: AccountId, amount: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE accounts SET balance = balance - ?2 WHERE id = ?1;",
            params![id, amount],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("account", id));
        }
        Ok(())
    }

    fn credit(&self, id: AccountId, amount: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE accounts SET balance = balance + ?2 WHERE id = ?1;",
            params![id, amount],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("account", id));
        }
        Ok(())
    }
}

fn parse_account_row(row: &Row<'_>) -> RepoResult<Account> {
    let account = Account {
        id: row.get("id")?,
        username: row.get("username")?,
        password_hash: row.get("password_hash")?,
        balance: row.get("balance")?,
        created_at: row.get("created_at")?,
    };

    if account.balance < 0 {
        return Err(RepoError::InvalidData(format!(
            "negative balance {} in accounts.balance for id {}",
            account.balance, account.id
        )));
    }

    Ok(account)
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(code, _)
            if code.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
