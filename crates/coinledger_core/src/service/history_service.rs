//! History projector: per-account balance, inventory and transfer history.
//!
//! # Invariants
//! - Read-only; takes no write locks.
//! - All parts of one summary come from the same committed snapshot.

use crate::error::LedgerResult;
use crate::model::account::AccountId;
use crate::model::summary::AccountSummary;
use crate::model::transaction::TransactionRecord;
use crate::repo::account_repo::{AccountRepository, SqliteAccountRepository};
use crate::repo::ledger_repo::{LedgerRepository, SqliteLedgerRepository};
use log::debug;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Read-side service answering balance/inventory/history queries.
pub struct HistoryService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> HistoryService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Builds the summary for `account`.
    ///
    /// Fails with `NotFound` when the account does not exist.
    pub fn get_summary(&self, account: AccountId) -> LedgerResult<AccountSummary> {
        // Deferred read transaction pins one snapshot across the four queries.
        let snapshot = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;

        let balance = SqliteAccountRepository::new(&snapshot)
            .get_by_id(account)?
            .balance;
        let records = SqliteLedgerRepository::new(&snapshot);
        let summary = AccountSummary {
            balance,
            inventory: records.list_inventory(account)?,
            received: records.list_received_transfers(account)?,
            sent: records.list_sent_transfers(account)?,
        };
        snapshot.commit()?;

        debug!(
            "event=history_summary module=history status=ok account={} inventory={} received={} sent={}",
            account,
            summary.inventory.len(),
            summary.received.len(),
            summary.sent.len()
        );
        Ok(summary)
    }

    /// Returns every record `account` took part in, purchases included, in commit order.
    ///
    /// Fails with `NotFound` when the account does not exist.
    pub fn get_audit_log(&self, account: AccountId) -> LedgerResult<Vec<TransactionRecord>> {
        let snapshot = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;
        SqliteAccountRepository::new(&snapshot).get_by_id(account)?;
        let records = SqliteLedgerRepository::new(&snapshot).list_transactions(account)?;
        snapshot.commit()?;

        debug!(
            "event=history_audit_log module=history status=ok account={} records={}",
            account,
            records.len()
        );
        Ok(records)
    }
}
