//! Catalog item model.

use serde::{Deserialize, Serialize};

/// Store-assigned item identity.
pub type ItemId = i64;

/// Purchasable catalog entry. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub price: i64,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Item {
    /// Items with a non-positive price exist only in a corrupt catalog.
    pub fn is_purchasable(&self) -> bool {
        self.price > 0
    }
}
