//! Money movement routes: transfers and QR payments.

use axum::{Router, extract::State, http::StatusCode, response::Response, routing::post};
use pocketbank_core::transfer::{QrGenerateRequest, QrPayRequest, TransferRequest};

use crate::error::ApiResult;
use crate::extractors::{ApiJson, IdempotencyKey, replayable};
use crate::{AppState, middleware::AuthUser};

/// Creates the transfer and QR routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transfers", post(transfer))
        .route("/qr/generate", post(generate_qr))
        .route("/qr/pay", post(pay_qr))
}

/// POST `/transfers`
async fn transfer(
    State(state): State<AppState>,
    auth: AuthUser,
    key: IdempotencyKey,
    ApiJson(request): ApiJson<TransferRequest>,
) -> ApiResult<Response> {
    let result = state
        .services
        .transfers
        .transfer(auth.user_id(), request, key.as_deref())
        .await?;
    Ok(replayable(StatusCode::OK, result.replayed, result.value))
}

/// POST `/qr/generate`
async fn generate_qr(
    State(state): State<AppState>,
    auth: AuthUser,
    key: IdempotencyKey,
    ApiJson(request): ApiJson<QrGenerateRequest>,
) -> ApiResult<Response> {
    let result = state
        .services
        .transfers
        .generate_qr(auth.user_id(), request, key.as_deref())
        .await?;
    Ok(replayable(StatusCode::CREATED, result.replayed, result.value))
}

/// POST `/qr/pay`
async fn pay_qr(
    State(state): State<AppState>,
    auth: AuthUser,
    key: IdempotencyKey,
    ApiJson(request): ApiJson<QrPayRequest>,
) -> ApiResult<Response> {
    let result = state
        .services
        .transfers
        .pay_qr(auth.user_id(), request, key.as_deref())
        .await?;
    Ok(replayable(StatusCode::OK, result.replayed, result.value))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use pocketbank_core::testing::TestBank;
    use serde_json::json;

    use crate::test_support::TestApp;

    #[tokio::test]
    async fn test_transfer_moves_money() {
        let app = TestApp::new();
        let (alice, a) = app.bank.open_account("Alice", 10_000).await;
        let (_, b) = app.bank.open_account("Bob", 500).await;
        let token = app.token(alice);

        let response = app
            .send(
                Method::POST,
                "/api/transfers",
                Some(&token),
                Some(json!({
                    "toAccountNumber": b.account_number.formatted(),
                    "amount": 3_000,
                    "simplePassword": TestBank::PIN,
                    "description": "dinner",
                })),
            )
            .await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["balanceAfter"], 7_000);
        assert_eq!(response.body["toAccountOwner"], "Bob");
        assert_eq!(response.body["status"], "COMPLETED");
        assert_eq!(app.bank.balance(a.id).await, 7_000);
        assert_eq!(app.bank.balance(b.id).await, 3_500);
    }

    #[tokio::test]
    async fn test_replayed_transfer_moves_money_once() {
        let app = TestApp::new();
        let (alice, a) = app.bank.open_account("Alice", 10_000).await;
        let (_, b) = app.bank.open_account("Bob", 0).await;
        let token = app.token(alice);
        let body = json!({
            "toAccountNumber": b.account_number.formatted(),
            "amount": 1_000,
            "simplePassword": TestBank::PIN,
        });

        let first = app
            .send_with_key(Method::POST, "/api/transfers", Some(&token), Some(body.clone()), Some("t-1"))
            .await;
        let second = app
            .send_with_key(Method::POST, "/api/transfers", Some(&token), Some(body), Some("t-1"))
            .await;

        assert_eq!(first.body["transactionId"], second.body["transactionId"]);
        assert_eq!(second.headers["idempotent-replayed"], "true");
        assert_eq!(app.bank.balance(a.id).await, 9_000);
    }

    #[tokio::test]
    async fn test_insufficient_funds_body() {
        let app = TestApp::new();
        let (alice, _) = app.bank.open_account("Alice", 50).await;
        let (_, b) = app.bank.open_account("Bob", 0).await;
        let token = app.token(alice);

        let response = app
            .send(
                Method::POST,
                "/api/transfers",
                Some(&token),
                Some(json!({
                    "toAccountNumber": b.account_number.formatted(),
                    "amount": 100,
                    "simplePassword": TestBank::PIN,
                })),
            )
            .await;

        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.body["error"], "INSUFFICIENT_FUNDS");
        assert!(response.body["message"].is_string());
    }

    #[tokio::test]
    async fn test_malformed_body_is_validation_error() {
        let app = TestApp::new();
        let (alice, _) = app.bank.open_account("Alice", 0).await;
        let token = app.token(alice);

        let response = app
            .send(Method::POST, "/api/transfers", Some(&token), Some(json!({ "amount": "lots" })))
            .await;
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.body["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_qr_is_paid_once() {
        let app = TestApp::new();
        let (seller, _) = app.bank.open_account("Cafe", 0).await;
        let (buyer, _) = app.bank.open_account("Kim", 20_000).await;
        let (other, _) = app.bank.open_account("Lee", 20_000).await;

        let generated = app
            .send(
                Method::POST,
                "/api/qr/generate",
                Some(&app.token(seller)),
                Some(json!({ "amount": 4_500, "description": "latte" })),
            )
            .await;
        assert_eq!(generated.status, StatusCode::CREATED);
        assert_eq!(generated.body["status"], "PENDING");
        let pay = json!({ "qrCode": generated.body["qrCode"], "simplePassword": TestBank::PIN });

        let paid = app
            .send(Method::POST, "/api/qr/pay", Some(&app.token(buyer)), Some(pay.clone()))
            .await;
        assert_eq!(paid.status, StatusCode::OK);
        assert_eq!(paid.body["sellerName"], "Cafe");
        assert_eq!(paid.body["balanceAfter"], 15_500);

        let again = app
            .send(Method::POST, "/api/qr/pay", Some(&app.token(other)), Some(pay))
            .await;
        assert_eq!(again.status, StatusCode::CONFLICT);
        assert_eq!(again.body["error"], "QR_ALREADY_USED");
    }
}
