//! Transaction history and statistics routes.

use axum::{Json, Router, extract::State, routing::get};
use chrono::NaiveDate;
use pocketbank_core::ledger::{TransactionType, TransactionView};
use pocketbank_core::ports::TransactionFilter;
use pocketbank_core::statistics::TransactionStatistics;
use pocketbank_shared::types::{PageRequest, PageResponse, TransactionId};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::extractors::{ApiPath, ApiQuery};
use crate::{AppState, middleware::AuthUser};

/// Creates the history and statistics routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transactions/filter", get(filter_transactions))
        .route("/transactions/{transaction_id}", get(get_transaction))
        .route("/statistics", get(statistics))
}

/// Query parameters of `GET /transactions/filter`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    /// Only this type, e.g. `TRANSFER`.
    #[serde(rename = "type")]
    pub tx_type: Option<String>,
    /// Inclusive start date (UTC, `YYYY-MM-DD`).
    pub start_date: Option<NaiveDate>,
    /// Inclusive end date (UTC, `YYYY-MM-DD`).
    pub end_date: Option<NaiveDate>,
    /// 0-indexed page.
    pub page: Option<u32>,
    /// Page size.
    pub size: Option<u32>,
}

/// GET `/transactions/filter`
async fn filter_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> ApiResult<Json<PageResponse<TransactionView>>> {
    let tx_type = query
        .tx_type
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(str::parse::<TransactionType>)
        .transpose()?;
    let filter = TransactionFilter {
        tx_type,
        start_date: query.start_date,
        end_date: query.end_date,
    };
    let defaults = PageRequest::default();
    let page = PageRequest::new(
        query.page.unwrap_or(defaults.page),
        query.size.unwrap_or(defaults.size),
    );

    Ok(Json(state.services.history.list(auth.user_id(), &filter, page).await?))
}

/// GET `/transactions/{transaction_id}`
async fn get_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<TransactionId>,
) -> ApiResult<Json<TransactionView>> {
    Ok(Json(state.services.history.get(auth.user_id(), id).await?))
}

/// GET `/statistics` - This month against last month, plus a 30-day trend.
async fn statistics(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<TransactionStatistics>> {
    Ok(Json(state.services.statistics.for_user(auth.user_id()).await?))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use pocketbank_core::testing::TestBank;
    use pocketbank_core::transfer::TransferRequest;
    use pocketbank_core::auth::SimplePassword;
    use pocketbank_shared::types::{Amount, UserId};
    use pocketbank_core::ledger::Account;

    use crate::test_support::TestApp;

    async fn pay(app: &TestApp, from: UserId, to: &Account, amount: i64) -> String {
        app.bank
            .services
            .transfers
            .transfer(
                from,
                TransferRequest {
                    to_account_number: to.account_number.clone(),
                    amount: Amount::new(amount),
                    simple_password: SimplePassword::new(TestBank::PIN),
                    description: None,
                },
                None,
            )
            .await
            .unwrap()
            .value
            .transaction_id
            .to_string()
    }

    #[tokio::test]
    async fn test_filter_by_type() {
        let app = TestApp::new();
        let (alice, _) = app.bank.open_account("Alice", 10_000).await;
        let (_, b) = app.bank.open_account("Bob", 0).await;
        pay(&app, alice, &b, 1_000).await;
        let token = app.token(alice);

        let all = app
            .send(Method::GET, "/api/transactions/filter", Some(&token), None)
            .await;
        assert_eq!(all.status, StatusCode::OK);
        assert_eq!(all.body["totalElements"], 2);
        assert_eq!(all.body["size"], 20);

        let transfers = app
            .send(Method::GET, "/api/transactions/filter?type=TRANSFER&size=1", Some(&token), None)
            .await;
        assert_eq!(transfers.body["totalElements"], 1);
        assert_eq!(transfers.body["content"][0]["type"], "TRANSFER");
        assert_eq!(transfers.body["content"][0]["counterpartyName"], "Bob");
    }

    #[tokio::test]
    async fn test_bad_filters_are_rejected() {
        let app = TestApp::new();
        let (alice, _) = app.bank.open_account("Alice", 0).await;
        let token = app.token(alice);

        let bad_type = app
            .send(Method::GET, "/api/transactions/filter?type=REFUND", Some(&token), None)
            .await;
        assert_eq!(bad_type.status, StatusCode::BAD_REQUEST);

        let reversed = app
            .send(
                Method::GET,
                "/api/transactions/filter?startDate=2025-05-10&endDate=2025-05-01",
                Some(&token),
                None,
            )
            .await;
        assert_eq!(reversed.status, StatusCode::BAD_REQUEST);
        assert_eq!(reversed.body["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_detail_is_hidden_from_strangers() {
        let app = TestApp::new();
        let (alice, _) = app.bank.open_account("Alice", 10_000).await;
        let (bob, b) = app.bank.open_account("Bob", 0).await;
        let (carol, _) = app.bank.open_account("Carol", 0).await;
        let id = pay(&app, alice, &b, 2_000).await;
        let uri = format!("/api/transactions/{id}");

        let received = app.send(Method::GET, &uri, Some(&app.token(bob)), None).await;
        assert_eq!(received.status, StatusCode::OK);
        assert_eq!(received.body["incoming"], true);

        let stranger = app.send(Method::GET, &uri, Some(&app.token(carol)), None).await;
        assert_eq!(stranger.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_statistics() {
        let app = TestApp::new();
        let (alice, _) = app.bank.open_account("Alice", 10_000).await;
        let (_, b) = app.bank.open_account("Bob", 0).await;
        pay(&app, alice, &b, 2_500).await;

        let response = app
            .send(Method::GET, "/api/statistics", Some(&app.token(alice)), None)
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["totalWithdrawal"], 2_500);
        assert_eq!(response.body["dailyTrends"].as_array().unwrap().len(), 30);
    }
}
