//! Ledger domain model.
//!
//! # Responsibility
//! - Define the records the ledger persists and projects.
//! - Keep storage-independent validation next to the types it guards.
//!
//! # Invariants
//! - Account balances never go below zero.
//! - Transaction records are immutable once committed.

pub mod account;
pub mod item;
pub mod summary;
pub mod transaction;
