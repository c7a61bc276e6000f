//! Ledger engine: atomic transfers and purchases.
//!
//! # Responsibility
//! - Run every balance mutation inside one exclusive transaction scope.
//! - Append the matching transaction record in the same scope.
//!
//! # Invariants
//! - The scope is opened with `BEGIN IMMEDIATE`; the writer lock covers the
//!   source account from the balance read until commit or rollback.
//! - Only the source balance is read-checked; the destination is credited with
//!   an atomic increment.
//! - Any error drops the scope uncommitted, which rolls it back.
//! - The engine keeps no state between calls; the caller identity is always
//!   an explicit argument.

use crate::error::{LedgerError, LedgerResult};
use crate::model::account::AccountId;
use crate::model::transaction::{NewTransaction, TransactionRecord};
use crate::repo::account_repo::{AccountRepository, SqliteAccountRepository};
use crate::repo::catalog_repo::{CatalogRepository, SqliteCatalogRepository};
use crate::repo::ledger_repo::{LedgerRepository, SqliteLedgerRepository};
use log::{error, info, warn};
use rusqlite::{Connection, InterruptHandle, Transaction, TransactionBehavior};
use std::time::Instant;

/// Ledger engine bound to one connection.
///
/// Concurrent callers each use their own connection to the same database;
/// the database writer lock serializes them.
pub struct LedgerService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> LedgerService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Returns a handle another thread can use to cancel the in-flight operation.
    ///
    /// An interrupted operation fails with `StorageFailure` (error code
    /// `interrupted`), leaves no effect and releases the writer lock.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.conn.get_interrupt_handle()
    }

    /// Moves `amount` coins from `from` to the account named `to_username`.
    ///
    /// # Errors
    /// - `InvalidInput` when `amount <= 0` or `to_username` is blank.
    /// - `NotFound` when the destination (or the caller) does not exist.
    /// - `SelfTransfer` when the destination is the caller.
    /// - `InsufficientFunds` when the caller's balance is below `amount`.
    pub fn transfer(
        &self,
        from: AccountId,
        to_username: &str,
        amount: i64,
    ) -> LedgerResult<TransactionRecord> {
        let started_at = Instant::now();
        let result = self.transfer_in_scope(from, to_username, amount);
        match &result {
            Ok(record) => info!(
                "event=ledger_transfer module=ledger status=ok from={} to={} amount={} tx={} duration_ms={}",
                from,
                record.to_account.unwrap_or_default(),
                amount,
                record.uuid,
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_rejection("ledger_transfer", from, err, started_at),
        }
        result
    }

    /// Spends the price of `item_name` from `buyer` and adds one unit to its inventory.
    ///
    /// # Errors
    /// - `InvalidInput` when `item_name` is blank.
    /// - `NotFound` when the item (or the buyer) does not exist.
    /// - `InvalidItem` when the catalog price is not positive.
    /// - `InsufficientFunds` when the buyer's balance is below the price.
    pub fn purchase(&self, buyer: AccountId, item_name: &str) -> LedgerResult<TransactionRecord> {
        let started_at = Instant::now();
        let result = self.purchase_in_scope(buyer, item_name);
        match &result {
            Ok(record) => info!(
                "event=ledger_purchase module=ledger status=ok buyer={} item={} amount={} tx={} duration_ms={}",
                buyer,
                record.item.unwrap_or_default(),
                record.amount,
                record.uuid,
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_rejection("ledger_purchase", buyer, err, started_at),
        }
        result
    }

    fn transfer_in_scope(
        &self,
        from: AccountId,
        to_username: &str,
        amount: i64,
    ) -> LedgerResult<TransactionRecord> {
        if amount <= 0 {
            return Err(LedgerError::invalid_input(format!(
                "transfer amount must be positive, got {amount}"
            )));
        }
        if to_username.trim().is_empty() {
            return Err(LedgerError::invalid_input("destination username is blank"));
        }

        let tx = self.begin_scope()?;
        let accounts = SqliteAccountRepository::new(&tx);

        let destination = accounts.get_by_username(to_username)?;
        if destination.id == from {
            return Err(LedgerError::SelfTransfer);
        }

        let balance = accounts.lock_for_update(from)?;
        if balance < amount {
            return Err(LedgerError::InsufficientFunds {
                balance,
                required: amount,
            });
        }

        accounts.debit(from, amount)?;
        accounts.credit(destination.id, amount)?;
        let record = SqliteLedgerRepository::new(&tx).append_transaction(
            &NewTransaction::transfer(from, destination.id, amount),
        )?;

        tx.commit()?;
        Ok(record)
    }

    fn purchase_in_scope(
        &self,
        buyer: AccountId,
        item_name: &str,
    ) -> LedgerResult<TransactionRecord> {
        if item_name.trim().is_empty() {
            return Err(LedgerError::invalid_input("item name is blank"));
        }

        let tx = self.begin_scope()?;
        let item = SqliteCatalogRepository::new(&tx).get_by_name(item_name)?;
        if !item.is_purchasable() {
            return Err(LedgerError::InvalidItem {
                name: item.name,
                price: item.price,
            });
        }

        let accounts = SqliteAccountRepository::new(&tx);
        let balance = accounts.lock_for_update(buyer)?;
        if balance < item.price {
            return Err(LedgerError::InsufficientFunds {
                balance,
                required: item.price,
            });
        }

        accounts.debit(buyer, item.price)?;
        let records = SqliteLedgerRepository::new(&tx);
        records.add_inventory_unit(buyer, item.id)?;
        let record =
            records.append_transaction(&NewTransaction::purchase(buyer, item.id, item.price))?;

        tx.commit()?;
        Ok(record)
    }

    fn begin_scope(&self) -> LedgerResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

fn log_rejection(event: &str, account: AccountId, err: &LedgerError, started_at: Instant) {
    let duration_ms = started_at.elapsed().as_millis();
    match err {
        LedgerError::StorageFailure(_) | LedgerError::Internal(_) => error!(
            "event={} module=ledger status=error account={} duration_ms={} error_code={} error={}",
            event,
            account,
            duration_ms,
            err.error_code(),
            err
        ),
        _ => warn!(
            "event={} module=ledger status=rejected account={} duration_ms={} error_code={}",
            event,
            account,
            duration_ms,
            err.error_code()
        ),
    }
}
