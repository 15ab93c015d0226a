//! Scheduled transfer routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::Response,
    routing::get,
};
use pocketbank_core::schedule::CreateScheduleRequest;
use pocketbank_shared::types::{PageRequest, PageResponse, ScheduleId};

use crate::dto::ScheduledTransferResponse;
use crate::error::ApiResult;
use crate::extractors::{ApiJson, ApiPath, ApiQuery, IdempotencyKey, replayable};
use crate::{AppState, middleware::AuthUser};

/// Creates the scheduled transfer routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/scheduled-transfers", get(list_schedules).post(create_schedule))
        .route(
            "/scheduled-transfers/{schedule_id}",
            get(get_schedule).delete(cancel_schedule),
        )
}

/// POST `/scheduled-transfers` - The PIN is checked now, not at execution.
async fn create_schedule(
    State(state): State<AppState>,
    auth: AuthUser,
    key: IdempotencyKey,
    ApiJson(request): ApiJson<CreateScheduleRequest>,
) -> ApiResult<Response> {
    let result = state
        .services
        .schedules
        .create(auth.user_id(), request, key.as_deref())
        .await?;
    Ok(replayable(
        StatusCode::CREATED,
        result.replayed,
        ScheduledTransferResponse::from(result.value),
    ))
}

/// GET `/scheduled-transfers`
async fn list_schedules(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> ApiResult<Json<PageResponse<ScheduledTransferResponse>>> {
    let schedules = state.services.schedules.list(auth.user_id(), page).await?;
    Ok(Json(schedules.map(ScheduledTransferResponse::from)))
}

/// GET `/scheduled-transfers/{schedule_id}`
async fn get_schedule(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<ScheduleId>,
) -> ApiResult<Json<ScheduledTransferResponse>> {
    let schedule = state.services.schedules.get(auth.user_id(), id).await?;
    Ok(Json(schedule.into()))
}

/// DELETE `/scheduled-transfers/{schedule_id}` - Cancel a PENDING schedule.
async fn cancel_schedule(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<ScheduleId>,
) -> ApiResult<Json<ScheduledTransferResponse>> {
    let schedule = state.services.schedules.cancel(auth.user_id(), id).await?;
    Ok(Json(schedule.into()))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use chrono::Duration;
    use pocketbank_core::clock::Clock;
    use pocketbank_core::testing::TestBank;
    use serde_json::json;

    use crate::test_support::TestApp;

    #[tokio::test]
    async fn test_create_list_cancel() {
        let app = TestApp::new();
        let (alice, _) = app.bank.open_account("Alice", 50_000).await;
        let (_, b) = app.bank.open_account("Bob", 0).await;
        let token = app.token(alice);
        let scheduled_at = app.bank.clock.now() + Duration::hours(2);

        let created = app
            .send(
                Method::POST,
                "/api/scheduled-transfers",
                Some(&token),
                Some(json!({
                    "toAccountNumber": b.account_number.formatted(),
                    "amount": 10_000,
                    "simplePassword": TestBank::PIN,
                    "scheduledAt": scheduled_at.to_rfc3339(),
                })),
            )
            .await;
        assert_eq!(created.status, StatusCode::CREATED);
        assert_eq!(created.body["status"], "PENDING");
        let id = created.body["scheduleId"].as_str().unwrap().to_string();

        let listed = app
            .send(Method::GET, "/api/scheduled-transfers?page=0&size=5", Some(&token), None)
            .await;
        assert_eq!(listed.body["totalElements"], 1);
        assert_eq!(listed.body["content"][0]["scheduleId"], id.as_str());

        let uri = format!("/api/scheduled-transfers/{id}");
        let cancelled = app.send(Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(cancelled.status, StatusCode::OK);
        assert_eq!(cancelled.body["status"], "CANCELLED");

        let again = app.send(Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(again.status, StatusCode::CONFLICT);
        assert_eq!(again.body["error"], "SCHEDULE_NOT_PENDING");
    }

    #[tokio::test]
    async fn test_too_soon_is_rejected() {
        let app = TestApp::new();
        let (alice, _) = app.bank.open_account("Alice", 50_000).await;
        let (_, b) = app.bank.open_account("Bob", 0).await;

        let response = app
            .send(
                Method::POST,
                "/api/scheduled-transfers",
                Some(&app.token(alice)),
                Some(json!({
                    "toAccountNumber": b.account_number.formatted(),
                    "amount": 10_000,
                    "simplePassword": TestBank::PIN,
                    "scheduledAt": app.bank.clock.now().to_rfc3339(),
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_bad_id_is_validation_error() {
        let app = TestApp::new();
        let (alice, _) = app.bank.open_account("Alice", 0).await;
        let response = app
            .send(Method::GET, "/api/scheduled-transfers/not-a-uuid", Some(&app.token(alice)), None)
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }
}
