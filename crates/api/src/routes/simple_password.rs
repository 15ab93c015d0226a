//! Simple-password (transaction PIN) routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
};
use pocketbank_core::auth::SimplePassword;
use serde::Deserialize;

use crate::dto::{SimplePasswordResponse, ValidResponse};
use crate::error::ApiResult;
use crate::extractors::ApiJson;
use crate::{AppState, middleware::AuthUser};

/// Creates the simple-password routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/simple-password/register", post(register))
        .route("/simple-password/verify", post(verify))
        .route("/simple-password/status", get(status))
        .route("/auth/simple-password", patch(change))
}

/// Body of `POST /simple-password/register`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Login password.
    pub password: String,
    /// New PIN.
    pub simple_password: SimplePassword,
    /// New PIN again.
    pub simple_password_confirm: SimplePassword,
}

/// Body of `PATCH /auth/simple-password`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequest {
    /// Current PIN.
    pub current_simple_password: SimplePassword,
    /// New PIN.
    pub new_simple_password: SimplePassword,
    /// New PIN again.
    pub new_simple_password_confirm: SimplePassword,
}

/// Body of `POST /simple-password/verify`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    /// PIN to check.
    pub simple_password: SimplePassword,
}

/// POST `/simple-password/register`
async fn register(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<SimplePasswordResponse>)> {
    state
        .services
        .accounts
        .register_simple_password(
            auth.user_id(),
            &request.password,
            request.simple_password.expose(),
            request.simple_password_confirm.expose(),
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(SimplePasswordResponse {
            has_simple_password: true,
            message: "Simple password registered",
        }),
    ))
}

/// PATCH `/auth/simple-password`
async fn change(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<ChangeRequest>,
) -> ApiResult<Json<SimplePasswordResponse>> {
    state
        .services
        .accounts
        .change_simple_password(
            auth.user_id(),
            request.current_simple_password.expose(),
            request.new_simple_password.expose(),
            request.new_simple_password_confirm.expose(),
        )
        .await?;
    Ok(Json(SimplePasswordResponse {
        has_simple_password: true,
        message: "Simple password changed",
    }))
}

/// POST `/simple-password/verify` - Counts toward the lock limit.
async fn verify(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<VerifyRequest>,
) -> ApiResult<Json<ValidResponse>> {
    state
        .services
        .accounts
        .verify_simple_password(auth.user_id(), request.simple_password.expose())
        .await?;
    Ok(Json(ValidResponse { valid: true }))
}

/// GET `/simple-password/status`
async fn status(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<SimplePasswordResponse>> {
    let registered = state.services.accounts.has_simple_password(auth.user_id()).await?;
    Ok(Json(SimplePasswordResponse {
        has_simple_password: registered,
        message: if registered {
            "Simple password is registered"
        } else {
            "Simple password is not registered"
        },
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use pocketbank_core::testing::TestBank;
    use serde_json::json;

    use crate::test_support::TestApp;

    #[tokio::test]
    async fn test_register_then_status() {
        let app = TestApp::new();
        let (user, _) = app.bank.open_account_without_pin("Kim").await;
        let token = app.token(user);

        let before = app.send(Method::GET, "/api/simple-password/status", Some(&token), None).await;
        assert_eq!(before.body["hasSimplePassword"], false);

        let body = json!({
            "password": TestBank::login_password(user),
            "simplePassword": "135790",
            "simplePasswordConfirm": "135790",
        });
        let registered = app
            .send(Method::POST, "/api/simple-password/register", Some(&token), Some(body))
            .await;
        assert_eq!(registered.status, StatusCode::CREATED);

        let after = app.send(Method::GET, "/api/simple-password/status", Some(&token), None).await;
        assert_eq!(after.body["hasSimplePassword"], true);
    }

    #[tokio::test]
    async fn test_verify_reports_mismatch() {
        let app = TestApp::new();
        let (user, _) = app.bank.open_account("Kim", 0).await;
        let token = app.token(user);

        let ok = app
            .send(Method::POST, "/api/simple-password/verify", Some(&token), Some(json!({ "simplePassword": TestBank::PIN })))
            .await;
        assert_eq!(ok.body, json!({ "valid": true }));

        let wrong = app
            .send(Method::POST, "/api/simple-password/verify", Some(&token), Some(json!({ "simplePassword": "000000" })))
            .await;
        assert_eq!(wrong.status, StatusCode::FORBIDDEN);
        assert_eq!(wrong.body["error"], "SIMPLE_PASSWORD_MISMATCH");
    }

    #[tokio::test]
    async fn test_change_pin() {
        let app = TestApp::new();
        let (user, _) = app.bank.open_account("Kim", 0).await;
        let token = app.token(user);

        let body = json!({
            "currentSimplePassword": TestBank::PIN,
            "newSimplePassword": "864200",
            "newSimplePasswordConfirm": "864200",
        });
        let changed = app
            .send(Method::PATCH, "/api/auth/simple-password", Some(&token), Some(body))
            .await;
        assert_eq!(changed.status, StatusCode::OK);
        app.bank.services.accounts.verify_simple_password(user, "864200").await.unwrap();
    }
}
