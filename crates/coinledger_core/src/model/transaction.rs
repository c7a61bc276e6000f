//! Transaction record model: the ledger's audit trail.
//!
//! # Invariants
//! - `Transfer` records carry both `from_account` and `to_account`.
//! - `Purchase` records carry `from_account` and `item`; the destination is the sink.
//! - `amount` is always positive.

use crate::model::account::AccountId;
use crate::model::item::ItemId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable audit identity of a committed record.
pub type TransactionId = Uuid;

/// Kind of balance mutation a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Coins moved between two accounts.
    Transfer,
    /// Coins spent on a catalog item.
    Purchase,
}

impl TransactionKind {
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::Purchase => "purchase",
        }
    }

    pub fn parse_db_str(value: &str) -> Option<Self> {
        match value {
            "transfer" => Some(Self::Transfer),
            "purchase" => Some(Self::Purchase),
            _ => None,
        }
    }
}

/// Immutable fact of a committed transfer or purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub uuid: TransactionId,
    pub kind: TransactionKind,
    pub from_account: Option<AccountId>,
    pub to_account: Option<AccountId>,
    pub item: Option<ItemId>,
    pub amount: i64,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Record contents prior to insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub uuid: TransactionId,
    pub kind: TransactionKind,
    pub from_account: Option<AccountId>,
    pub to_account: Option<AccountId>,
    pub item: Option<ItemId>,
    pub amount: i64,
}

impl NewTransaction {
    pub fn transfer(from: AccountId, to: AccountId, amount: i64) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            kind: TransactionKind::Transfer,
            from_account: Some(from),
            to_account: Some(to),
            item: None,
            amount,
        }
    }

    pub fn purchase(buyer: AccountId, item: ItemId, price: i64) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            kind: TransactionKind::Purchase,
            from_account: Some(buyer),
            to_account: None,
            item: Some(item),
            amount: price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NewTransaction, TransactionKind};

    #[test]
    fn kind_db_strings_are_stable() {
        for kind in [TransactionKind::Transfer, TransactionKind::Purchase] {
            assert_eq!(TransactionKind::parse_db_str(kind.as_db_str()), Some(kind));
        }
        assert_eq!(TransactionKind::parse_db_str("refund"), None);
    }

    #[test]
    fn purchase_has_no_destination_account() {
        let record = NewTransaction::purchase(7, 3, 80);
        assert_eq!(record.from_account, Some(7));
        assert_eq!(record.to_account, None);
        assert_eq!(record.item, Some(3));
    }
}
