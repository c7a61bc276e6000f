//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the Account Store, Catalog Store and record-log contracts.
//! - Isolate SQLite query details from ledger orchestration.
//!
//! # Invariants
//! - Repositories never open or commit transactions; scope belongs to the caller.
//! - Repository APIs return semantic errors (`NotFound`, `AlreadyExists`) in
//!   addition to DB transport errors.

pub mod account_repo;
pub mod catalog_repo;
pub mod ledger_repo;
