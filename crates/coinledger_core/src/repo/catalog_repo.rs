//! Catalog Store contract and SQLite implementation.
//!
//! The catalog is read-only to the ledger; rows come from the seed migration.

use crate::model::item::Item;
use crate::repo::account_repo::{RepoError, RepoResult};
use rusqlite::{Connection, Row};

const ITEM_SELECT_SQL: &str = "SELECT id, name, price, created_at FROM items";

/// Repository interface for the Catalog Store.
pub trait CatalogRepository {
    fn get_by_name(&self, name: &str) -> RepoResult<Item>;
    /// Lists all items ordered by name.
    fn list_items(&self) -> RepoResult<Vec<Item>>;
}

/// SQLite-backed Catalog Store.
pub struct SqliteCatalogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CatalogRepository for SqliteCatalogRepository<'_> {
    fn get_by_name(&self, name: &str) -> RepoResult<Item> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ITEM_SELECT_SQL} WHERE name = ?1;"))?;
        let mut rows = stmt.query([name])?;
        match rows.next()? {
            Some(row) => parse_item_row(row),
            None => Err(RepoError::not_found("item", name)),
        }
    }

    fn list_items(&self) -> RepoResult<Vec<Item>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ITEM_SELECT_SQL} ORDER BY name ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }
        Ok(items)
    }
}

fn parse_item_row(row: &Row<'_>) -> RepoResult<Item> {
    Ok(Item {
        id: row.get("id")?,
        name: row.get("name")?,
        price: row.get("price")?,
        created_at: row.get("created_at")?,
    })
}
