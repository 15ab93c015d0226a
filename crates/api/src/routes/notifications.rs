//! Notification inbox routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, patch},
};
use pocketbank_shared::types::{NotificationId, PageRequest, PageResponse};

use crate::dto::{CountResponse, NotificationResponse};
use crate::error::ApiResult;
use crate::extractors::{ApiPath, ApiQuery};
use crate::{AppState, middleware::AuthUser};

/// Creates the notification routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_all))
        .route("/notifications/unread", get(list_unread))
        .route("/notifications/unread/count", get(unread_count))
        .route(
            "/notifications/read-all",
            patch(mark_all_read).delete(delete_read),
        )
        .route("/notifications/{notification_id}/read", patch(mark_read))
        .route("/notifications/{notification_id}", delete(delete_notification))
}

async fn list(
    state: &AppState,
    auth: &AuthUser,
    unread_only: bool,
    page: PageRequest,
) -> ApiResult<Json<PageResponse<NotificationResponse>>> {
    let notifications = state
        .services
        .notifications
        .list(auth.user_id(), unread_only, page)
        .await?;
    Ok(Json(notifications.map(NotificationResponse::from)))
}

/// GET `/notifications`
async fn list_all(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> ApiResult<Json<PageResponse<NotificationResponse>>> {
    list(&state, &auth, false, page).await
}

/// GET `/notifications/unread`
async fn list_unread(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> ApiResult<Json<PageResponse<NotificationResponse>>> {
    list(&state, &auth, true, page).await
}

/// GET `/notifications/unread/count`
async fn unread_count(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<CountResponse>> {
    let count = state.services.notifications.unread_count(auth.user_id()).await?;
    Ok(Json(CountResponse { count }))
}

/// PATCH `/notifications/{notification_id}/read`
async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<NotificationId>,
) -> ApiResult<StatusCode> {
    state.services.notifications.mark_read(auth.user_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH `/notifications/read-all`
async fn mark_all_read(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<CountResponse>> {
    let count = state.services.notifications.mark_all_read(auth.user_id()).await?;
    Ok(Json(CountResponse { count }))
}

/// DELETE `/notifications/{notification_id}`
async fn delete_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<NotificationId>,
) -> ApiResult<StatusCode> {
    state.services.notifications.delete(auth.user_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE `/notifications/read-all` - Removes every read notification.
async fn delete_read(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<CountResponse>> {
    let count = state.services.notifications.delete_read(auth.user_id()).await?;
    Ok(Json(CountResponse { count }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use pocketbank_core::auth::SimplePassword;
    use pocketbank_core::testing::TestBank;
    use pocketbank_core::transfer::TransferRequest;
    use pocketbank_shared::types::Amount;
    use serde_json::json;

    use crate::test_support::TestApp;

    #[tokio::test]
    async fn test_inbox_read_flow() {
        let app = TestApp::new();
        let (alice, _) = app.bank.open_account("Alice", 10_000).await;
        let (bob, b) = app.bank.open_account("Bob", 0).await;
        for amount in [1_000, 2_000] {
            app.bank
                .services
                .transfers
                .transfer(
                    alice,
                    TransferRequest {
                        to_account_number: b.account_number.clone(),
                        amount: Amount::new(amount),
                        simple_password: SimplePassword::new(TestBank::PIN),
                        description: None,
                    },
                    None,
                )
                .await
                .unwrap();
        }
        let token = app.token(bob);

        let count = app
            .send(Method::GET, "/api/notifications/unread/count", Some(&token), None)
            .await;
        assert_eq!(count.body, json!({ "count": 2 }));

        let unread = app
            .send(Method::GET, "/api/notifications/unread?size=1", Some(&token), None)
            .await;
        assert_eq!(unread.body["totalElements"], 2);
        assert_eq!(unread.body["totalPages"], 2);
        assert_eq!(unread.body["content"][0]["type"], "TRANSFER_RECEIVED");
        let id = unread.body["content"][0]["notificationId"].as_str().unwrap();

        let read = app
            .send(Method::PATCH, &format!("/api/notifications/{id}/read"), Some(&token), None)
            .await;
        assert_eq!(read.status, StatusCode::NO_CONTENT);

        let all = app
            .send(Method::PATCH, "/api/notifications/read-all", Some(&token), None)
            .await;
        assert_eq!(all.body, json!({ "count": 1 }));

        let cleared = app
            .send(Method::DELETE, "/api/notifications/read-all", Some(&token), None)
            .await;
        assert_eq!(cleared.body, json!({ "count": 2 }));

        let listed = app.send(Method::GET, "/api/notifications", Some(&token), None).await;
        assert_eq!(listed.body["totalElements"], 0);
    }

    #[tokio::test]
    async fn test_foreign_notification_is_not_found() {
        let app = TestApp::new();
        let (alice, _) = app.bank.open_account("Alice", 10_000).await;
        let (bob, b) = app.bank.open_account("Bob", 0).await;
        app.bank
            .services
            .transfers
            .transfer(
                alice,
                TransferRequest {
                    to_account_number: b.account_number.clone(),
                    amount: Amount::new(1_000),
                    simple_password: SimplePassword::new(TestBank::PIN),
                    description: None,
                },
                None,
            )
            .await
            .unwrap();
        let bobs = app
            .send(Method::GET, "/api/notifications", Some(&app.token(bob)), None)
            .await;
        let id = bobs.body["content"][0]["notificationId"].as_str().unwrap();

        let response = app
            .send(Method::DELETE, &format!("/api/notifications/{id}"), Some(&app.token(alice)), None)
            .await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }
}
