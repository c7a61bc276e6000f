//! Read models returned by the history projector.

use serde::{Deserialize, Serialize};

/// Owned quantity of one catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLine {
    pub item: String,
    pub quantity: i64,
}

/// Incoming transfer as seen by the receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedTransfer {
    pub from_user: String,
    pub amount: i64,
}

/// Outgoing transfer as seen by the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentTransfer {
    pub to_user: String,
    pub amount: i64,
}

/// Per-account balance, inventory and transfer history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub balance: i64,
    pub inventory: Vec<InventoryLine>,
    pub received: Vec<ReceivedTransfer>,
    pub sent: Vec<SentTransfer>,
}
