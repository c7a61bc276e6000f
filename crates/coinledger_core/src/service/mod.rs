//! Ledger use-case services.
//!
//! # Responsibility
//! - `ledger_service`: atomic transfer/purchase engine.
//! - `history_service`: read-only summary projector.
//! - `auth_service`: create-or-verify login and identity assertions.
//!
//! # Invariants
//! - Services take the caller identity as an explicit argument.
//! - Services return `LedgerError`, never repository or SQLite errors.

pub mod auth_service;
pub mod history_service;
pub mod ledger_service;
