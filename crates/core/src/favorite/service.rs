//! Saved recipients.

use std::sync::Arc;

use pocketbank_shared::types::{AccountNumber, FavoriteId, UserId};
use serde::Deserialize;
use tracing::{debug, info};

use super::types::{Favorite, FavoriteView, MAX_MEMO_CHARS, MAX_NICKNAME_CHARS};
use crate::account::require_account;
use crate::clock::Clock;
use crate::ledger::{Account, LedgerError, LedgerResult};
use crate::ports::Repositories;

/// Save a recipient.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFavoriteRequest {
    /// Target account number.
    pub account_number: AccountNumber,
    /// Label, 1-30 characters.
    pub nickname: String,
    /// Optional note.
    #[serde(default)]
    pub memo: Option<String>,
}

/// Edit a saved recipient. Absent fields are left unchanged; an empty memo
/// clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFavoriteRequest {
    /// New label.
    #[serde(default)]
    pub nickname: Option<String>,
    /// New note.
    #[serde(default)]
    pub memo: Option<String>,
}

/// Manages the caller's favorites.
pub struct FavoriteService {
    repos: Arc<dyn Repositories>,
    clock: Arc<dyn Clock>,
}

impl FavoriteService {
    /// Creates the service.
    #[must_use]
    pub fn new(repos: Arc<dyn Repositories>, clock: Arc<dyn Clock>) -> Self {
        Self { repos, clock }
    }

    /// Saves a recipient. The target must exist and not be the caller.
    pub async fn add(&self, user: UserId, request: AddFavoriteRequest) -> LedgerResult<FavoriteView> {
        let account = require_account(self.repos.as_ref(), user).await?;
        let nickname = normalize_nickname(&request.nickname)?;
        let memo = normalize_memo(request.memo.as_deref())?;

        let target = self
            .repos
            .accounts()
            .find_by_number(&request.account_number)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(request.account_number.to_string()))?;
        if target.id == account.id {
            return Err(LedgerError::validation("cannot save your own account"));
        }

        let favorite = Favorite {
            id: FavoriteId::new(),
            account_id: account.id,
            account_number: target.account_number,
            nickname,
            memo,
            created_at: self.clock.now(),
        };
        self.repos.favorites().insert_favorite(&favorite).await?;
        info!(favorite_id = %favorite.id, "favorite added");

        Ok(FavoriteView {
            favorite,
            account_owner_name: Some(target.owner_name),
        })
    }

    /// Lists the caller's favorites, newest first.
    pub async fn list(&self, user: UserId) -> LedgerResult<Vec<FavoriteView>> {
        let account = require_account(self.repos.as_ref(), user).await?;
        let favorites = self.repos.favorites().list_favorites(account.id).await?;

        let mut views = Vec::with_capacity(favorites.len());
        for favorite in favorites {
            views.push(self.resolve(favorite).await?);
        }
        Ok(views)
    }

    /// Returns one of the caller's favorites.
    pub async fn get(&self, user: UserId, id: FavoriteId) -> LedgerResult<FavoriteView> {
        let account = require_account(self.repos.as_ref(), user).await?;
        let favorite = self.owned(&account, id).await?;
        self.resolve(favorite).await
    }

    /// Updates nickname and/or memo.
    pub async fn update(
        &self,
        user: UserId,
        id: FavoriteId,
        request: UpdateFavoriteRequest,
    ) -> LedgerResult<FavoriteView> {
        let account = require_account(self.repos.as_ref(), user).await?;
        let mut favorite = self.owned(&account, id).await?;

        if let Some(nickname) = request.nickname.as_deref() {
            favorite.nickname = normalize_nickname(nickname)?;
        }
        if let Some(memo) = request.memo.as_deref() {
            favorite.memo = normalize_memo(Some(memo))?;
        }
        self.repos.favorites().update_favorite(&favorite).await?;
        debug!(favorite_id = %id, "favorite updated");

        self.resolve(favorite).await
    }

    /// Deletes one of the caller's favorites.
    pub async fn delete(&self, user: UserId, id: FavoriteId) -> LedgerResult<()> {
        let account = require_account(self.repos.as_ref(), user).await?;
        if self.repos.favorites().delete_favorite(id, account.id).await? {
            info!(favorite_id = %id, "favorite deleted");
            Ok(())
        } else {
            Err(LedgerError::NotFound(format!("favorite {id}")))
        }
    }

    async fn owned(&self, account: &Account, id: FavoriteId) -> LedgerResult<Favorite> {
        self.repos
            .favorites()
            .find_favorite(id)
            .await?
            .filter(|f| f.account_id == account.id)
            .ok_or_else(|| LedgerError::NotFound(format!("favorite {id}")))
    }

    /// Attaches the target's current owner name, if it still resolves.
    async fn resolve(&self, favorite: Favorite) -> LedgerResult<FavoriteView> {
        let owner = self
            .repos
            .accounts()
            .find_by_number(&favorite.account_number)
            .await?;
        Ok(FavoriteView {
            favorite,
            account_owner_name: owner.map(|a| a.owner_name),
        })
    }
}

fn normalize_nickname(raw: &str) -> LedgerResult<String> {
    let nickname = raw.trim();
    if nickname.is_empty() {
        return Err(LedgerError::validation("nickname is required"));
    }
    if nickname.chars().count() > MAX_NICKNAME_CHARS {
        return Err(LedgerError::validation(format!(
            "nickname must be at most {MAX_NICKNAME_CHARS} characters"
        )));
    }
    Ok(nickname.to_string())
}

fn normalize_memo(raw: Option<&str>) -> LedgerResult<Option<String>> {
    let Some(memo) = raw.map(str::trim).filter(|m| !m.is_empty()) else {
        return Ok(None);
    };
    if memo.chars().count() > MAX_MEMO_CHARS {
        return Err(LedgerError::validation(format!(
            "memo must be at most {MAX_MEMO_CHARS} characters"
        )));
    }
    Ok(Some(memo.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestBank;

    fn request(number: &AccountNumber, nickname: &str) -> AddFavoriteRequest {
        AddFavoriteRequest {
            account_number: number.clone(),
            nickname: nickname.to_string(),
            memo: Some("  rent  ".to_string()),
        }
    }

    #[tokio::test]
    async fn test_add_resolves_owner_name() {
        let bank = TestBank::new();
        let (me, _) = bank.open_account("Kim", 0).await;
        let (_, landlord) = bank.open_account("Park", 0).await;

        let view = bank
            .services
            .favorites
            .add(me, request(&landlord.account_number, "Landlord"))
            .await
            .unwrap();

        assert_eq!(view.account_owner_name.as_deref(), Some("Park"));
        assert_eq!(view.favorite.memo.as_deref(), Some("rent"));
        assert_eq!(bank.services.favorites.list(me).await.unwrap(), vec![view]);
    }

    #[tokio::test]
    async fn test_duplicate_and_self_are_rejected() {
        let bank = TestBank::new();
        let (me, mine) = bank.open_account("Kim", 0).await;
        let (_, other) = bank.open_account("Park", 0).await;
        let favorites = &bank.services.favorites;

        favorites.add(me, request(&other.account_number, "P")).await.unwrap();
        assert!(matches!(
            favorites.add(me, request(&other.account_number, "P2")).await,
            Err(LedgerError::Conflict(_))
        ));
        assert!(matches!(
            favorites.add(me, request(&mine.account_number, "me")).await,
            Err(LedgerError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_and_delete_are_owner_only() {
        let bank = TestBank::new();
        let (me, _) = bank.open_account("Kim", 0).await;
        let (stranger, _) = bank.open_account("Choi", 0).await;
        let (_, other) = bank.open_account("Park", 0).await;
        let favorites = &bank.services.favorites;

        let view = favorites.add(me, request(&other.account_number, "P")).await.unwrap();
        let id = view.favorite.id;

        let update = UpdateFavoriteRequest {
            nickname: Some("Mom".into()),
            memo: Some(String::new()),
        };
        assert!(matches!(
            favorites.update(stranger, id, update.clone()).await,
            Err(LedgerError::NotFound(_))
        ));
        let updated = favorites.update(me, id, update).await.unwrap();
        assert_eq!(updated.favorite.nickname, "Mom");
        assert_eq!(updated.favorite.memo, None);

        assert!(favorites.delete(stranger, id).await.is_err());
        favorites.delete(me, id).await.unwrap();
        assert!(favorites.list(me).await.unwrap().is_empty());
    }

    #[test]
    fn test_nickname_limits() {
        assert!(normalize_nickname("   ").is_err());
        assert!(normalize_nickname(&"가".repeat(30)).is_ok());
        assert!(normalize_nickname(&"가".repeat(31)).is_err());
    }
}
