//! Transaction record log and inventory persistence.
//!
//! # Responsibility
//! - Append immutable transaction records.
//! - Maintain per-account inventory counts.
//! - Serve the read queries the history projector composes.
//!
//! # Invariants
//! - Records are insert-only; there is no update or delete path.
//! - Inventory rows are upserted, so (account, item) never duplicates.
//! - History rows come back in commit order (`transactions.id ASC`).

use crate::model::account::AccountId;
use crate::model::item::ItemId;
use crate::model::summary::{InventoryLine, ReceivedTransfer, SentTransfer};
use crate::model::transaction::{NewTransaction, TransactionKind, TransactionRecord};
use crate::repo::account_repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const TRANSACTION_SELECT_SQL: &str = "SELECT
    uuid,
    kind,
    from_account_id,
    to_account_id,
    item_id,
    amount,
    created_at
FROM transactions";

/// Repository interface for the record log and inventory relation.
pub trait LedgerRepository {
    fn append_transaction(&self, record: &NewTransaction) -> RepoResult<TransactionRecord>;
    /// Adds one unit of `item` to the account's inventory, returning the new quantity.
    fn add_inventory_unit(&self, account: AccountId, item: ItemId) -> RepoResult<i64>;
    fn list_inventory(&self, account: AccountId) -> RepoResult<Vec<InventoryLine>>;
    fn list_received_transfers(&self, account: AccountId) -> RepoResult<Vec<ReceivedTransfer>>;
    fn list_sent_transfers(&self, account: AccountId) -> RepoResult<Vec<SentTransfer>>;
    /// Every record the account took part in, either side, in commit order.
    fn list_transactions(&self, account: AccountId) -> RepoResult<Vec<TransactionRecord>>;
}

/// SQLite-backed record log.
pub struct SqliteLedgerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLedgerRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl LedgerRepository for SqliteLedgerRepository<'_> {
    fn append_transaction(&self, record: &NewTransaction) -> RepoResult<TransactionRecord> {
        let uuid = record.uuid.to_string();
        self.conn.execute(
            "INSERT INTO transactions (
                uuid,
                kind,
                from_account_id,
                to_account_id,
                item_id,
                amount
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                uuid.as_str(),
                record.kind.as_db_str(),
                record.from_account,
                record.to_account,
                record.item,
                record.amount,
            ],
        )?;

        let mut stmt = self
            .conn
            .prepare(&format!("{TRANSACTION_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([uuid.as_str()])?;
        match rows.next()? {
            Some(row) => parse_transaction_row(row),
            None => Err(RepoError::InvalidData(format!(
                "transaction {uuid} missing right after insert"
            ))),
        }
    }

    fn add_inventory_unit(&self, account: AccountId, item: ItemId) -> RepoResult<i64> {
        let quantity = self.conn.query_row(
            "INSERT INTO inventory (account_id, item_id, quantity)
             VALUES (?1, ?2, 1)
             ON CONFLICT (account_id, item_id)
             DO UPDATE SET quantity = quantity + 1
             RETURNING quantity;",
            params![account, item],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(quantity)
    }

    fn list_inventory(&self, account: AccountId) -> RepoResult<Vec<InventoryLine>> {
        let mut stmt = self.conn.prepare(
            "SELECT i.name, inv.quantity
             FROM inventory inv
             INNER JOIN items i ON i.id = inv.item_id
             WHERE inv.account_id = ?1
             ORDER BY i.name ASC;",
        )?;
        let mut rows = stmt.query([account])?;
        let mut lines = Vec::new();
        while let Some(row) = rows.next()? {
            lines.push(InventoryLine {
                item: row.get(0)?,
                quantity: row.get(1)?,
            });
        }
        Ok(lines)
    }

    fn list_received_transfers(&self, account: AccountId) -> RepoResult<Vec<ReceivedTransfer>> {
        let mut stmt = self.conn.prepare(
            "SELECT a.username, t.amount
             FROM transactions t
             INNER JOIN accounts a ON a.id = t.from_account_id
             WHERE t.to_account_id = ?1
               AND t.kind = 'transfer'
             ORDER BY t.id ASC;",
        )?;
        let mut rows = stmt.query([account])?;
        let mut received = Vec::new();
        while let Some(row) = rows.next()? {
            received.push(ReceivedTransfer {
                from_user: row.get(0)?,
                amount: row.get(1)?,
            });
        }
        Ok(received)
    }

    fn list_sent_transfers(&self, account: AccountId) -> RepoResult<Vec<SentTransfer>> {
        let mut stmt = self.conn.prepare(
            "SELECT a.username, t.amount
             FROM transactions t
             INNER JOIN accounts a ON a.id = t.to_account_id
             WHERE t.from_account_id = ?1
               AND t.kind = 'transfer'
             ORDER BY t.id ASC;",
        )?;
        let mut rows = stmt.query([account])?;
        let mut sent = Vec::new();
        while let Some(row) = rows.next()? {
            sent.push(SentTransfer {
                to_user: row.get(0)?,
                amount: row.get(1)?,
            });
        }
        Ok(sent)
    }

    fn list_transactions(&self, account: AccountId) -> RepoResult<Vec<TransactionRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TRANSACTION_SELECT_SQL}
             WHERE from_account_id = ?1 OR to_account_id = ?1
             ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([account])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_transaction_row(row)?);
        }
        Ok(records)
    }
}

fn parse_transaction_row(row: &Row<'_>) -> RepoResult<TransactionRecord> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{uuid_text}` in transactions.uuid"
        ))
    })?;

    let kind_text: String = row.get("kind")?;
    let kind = TransactionKind::parse_db_str(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid kind `{kind_text}` in transactions.kind"
        ))
    })?;

    Ok(TransactionRecord {
        uuid,
        kind,
        from_account: row.get("from_account_id")?,
        to_account: row.get("to_account_id")?,
        item: row.get("item_id")?,
        amount: row.get("amount")?,
        created_at: row.get("created_at")?,
    })
}
