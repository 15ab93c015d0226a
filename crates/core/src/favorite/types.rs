//! Favorite recipient types.

use chrono::{DateTime, Utc};
use pocketbank_shared::types::{AccountId, AccountNumber, FavoriteId};
use serde::{Deserialize, Serialize};

/// Longest nickname, in characters.
pub const MAX_NICKNAME_CHARS: usize = 30;

/// Longest memo, in characters.
pub const MAX_MEMO_CHARS: usize = 200;

/// A saved transfer recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    /// Favorite ID.
    pub id: FavoriteId,
    /// Owning account.
    pub account_id: AccountId,
    /// Target account number.
    pub account_number: AccountNumber,
    /// Owner-chosen label.
    pub nickname: String,
    /// Optional note.
    pub memo: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// A favorite with the target owner's name resolved at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteView {
    /// The stored favorite.
    #[serde(flatten)]
    pub favorite: Favorite,
    /// Current owner name; absent if the target account no longer resolves.
    pub account_owner_name: Option<String>,
}
