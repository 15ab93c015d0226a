//! Account routes: opening, lookup, self-deposit and locking.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::Response,
    routing::{get, post},
};
use pocketbank_core::account::{AccountOwner, LockStatus};
use pocketbank_core::ledger::{Account, AccountStatus};
use pocketbank_core::transfer::SelfDepositRequest;
use pocketbank_shared::types::AccountNumber;
use serde::Deserialize;

use crate::dto::AccountResponse;
use crate::error::{ApiError, ApiResult};
use crate::extractors::{ApiJson, ApiPath, IdempotencyKey, replayable};
use crate::{AppState, middleware::AuthUser};

/// Creates the account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", post(open_account))
        .route("/accounts/me", get(my_account))
        .route("/accounts/lock-status", get(lock_status))
        .route("/accounts/deposit", post(self_deposit))
        .route("/accounts/lock", post(lock_account))
        .route("/accounts/unlock", post(unlock_account))
        .route("/accounts/{account_number}", get(account_owner))
}

/// Body of `POST /accounts/unlock`.
#[derive(Deserialize)]
pub struct UnlockRequest {
    /// Login password, checked with the auth service.
    pub password: String,
}

fn lock_state(account: &Account) -> LockStatus {
    LockStatus {
        is_locked: account.status == AccountStatus::Locked,
        failed_attempts: account.failed_password_attempts,
    }
}

/// POST `/accounts` - Open the caller's account, named after the token.
async fn open_account(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<(StatusCode, Json<AccountResponse>)> {
    let account = state.services.accounts.open(auth.user_id(), auth.name()).await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

/// GET `/accounts/me`
async fn my_account(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<AccountResponse>> {
    let account = state.services.accounts.me(auth.user_id()).await?;
    Ok(Json(account.into()))
}

/// GET `/accounts/{account_number}` - Owner name for recipient confirmation.
async fn account_owner(
    State(state): State<AppState>,
    _auth: AuthUser,
    ApiPath(raw): ApiPath<String>,
) -> ApiResult<Json<AccountOwner>> {
    let number = AccountNumber::parse(&raw).map_err(|e| ApiError::validation(e.to_string()))?;
    Ok(Json(state.services.accounts.owner_of(&number).await?))
}

/// POST `/accounts/deposit`
async fn self_deposit(
    State(state): State<AppState>,
    auth: AuthUser,
    key: IdempotencyKey,
    ApiJson(request): ApiJson<SelfDepositRequest>,
) -> ApiResult<Response> {
    let result = state
        .services
        .transfers
        .self_deposit(auth.user_id(), request, key.as_deref())
        .await?;
    Ok(replayable(StatusCode::OK, result.replayed, result.value))
}

/// POST `/accounts/lock`
async fn lock_account(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<LockStatus>> {
    let account = state.services.accounts.lock(auth.user_id()).await?;
    Ok(Json(lock_state(&account)))
}

/// POST `/accounts/unlock`
async fn unlock_account(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<UnlockRequest>,
) -> ApiResult<Json<LockStatus>> {
    let account = state
        .services
        .accounts
        .unlock(auth.user_id(), &request.password)
        .await?;
    Ok(Json(lock_state(&account)))
}

/// GET `/accounts/lock-status`
async fn lock_status(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<LockStatus>> {
    Ok(Json(state.services.accounts.lock_status(auth.user_id()).await?))
}
