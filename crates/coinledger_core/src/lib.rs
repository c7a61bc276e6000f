//! Core of the CoinLedger marketplace ledger.
//! This crate is the single source of truth for balance invariants: coins are
//! never created, destroyed or double-spent.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{AuthConfig, ConfigError, LedgerConfig, PasswordHashingConfig};
pub use error::{LedgerError, LedgerErrorKind, LedgerResult};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::account::{Account, AccountId, INITIAL_BALANCE};
pub use model::item::{Item, ItemId};
pub use model::summary::{AccountSummary, InventoryLine, ReceivedTransfer, SentTransfer};
pub use model::transaction::{TransactionId, TransactionKind, TransactionRecord};
pub use repo::account_repo::{AccountRepository, RepoError, RepoResult, SqliteAccountRepository};
pub use repo::catalog_repo::{CatalogRepository, SqliteCatalogRepository};
pub use repo::ledger_repo::{LedgerRepository, SqliteLedgerRepository};
pub use service::auth_service::{
    AuthToken, Authenticator, Caller, Claims, CredentialHasher, TokenIssuer,
};
pub use service::history_service::HistoryService;
pub use service::ledger_service::LedgerService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
