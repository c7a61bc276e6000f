//! Account domain model.
//!
//! # Invariants
//! - `username` is unique and never changes after creation.
//! - `balance` is non-negative at every committed state.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Store-assigned account identity.
pub type AccountId = i64;

/// Coins minted for every newly created account.
pub const INITIAL_BALANCE: i64 = 1000;

const USERNAME_MAX_CHARS: usize = 64;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}\p{N}_.@\-]+$").expect("valid username regex"));

/// A user's identity plus coin balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    /// PHC-formatted credential hash. Never serialized outward.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub balance: i64,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Returns whether `username` is acceptable as an account identity.
///
/// Accepts letters, digits and `_ . @ -`, up to 64 characters.
pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.chars().count() <= USERNAME_MAX_CHARS
        && USERNAME_RE.is_match(username)
}
