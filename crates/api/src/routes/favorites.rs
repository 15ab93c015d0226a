//! Favorite (saved recipient) routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use pocketbank_core::favorite::{AddFavoriteRequest, UpdateFavoriteRequest};
use pocketbank_shared::types::FavoriteId;

use crate::dto::FavoriteResponse;
use crate::error::ApiResult;
use crate::extractors::{ApiJson, ApiPath};
use crate::{AppState, middleware::AuthUser};

/// Creates the favorite routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/favorites", get(list_favorites).post(add_favorite))
        .route(
            "/favorites/{favorite_id}",
            get(get_favorite).patch(update_favorite).delete(delete_favorite),
        )
}

/// POST `/favorites`
async fn add_favorite(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<AddFavoriteRequest>,
) -> ApiResult<(StatusCode, Json<FavoriteResponse>)> {
    let favorite = state.services.favorites.add(auth.user_id(), request).await?;
    Ok((StatusCode::CREATED, Json(favorite.into())))
}

/// GET `/favorites`
async fn list_favorites(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<FavoriteResponse>>> {
    let favorites = state.services.favorites.list(auth.user_id()).await?;
    Ok(Json(favorites.into_iter().map(FavoriteResponse::from).collect()))
}

/// GET `/favorites/{favorite_id}`
async fn get_favorite(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<FavoriteId>,
) -> ApiResult<Json<FavoriteResponse>> {
    Ok(Json(state.services.favorites.get(auth.user_id(), id).await?.into()))
}

/// PATCH `/favorites/{favorite_id}`
async fn update_favorite(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<FavoriteId>,
    ApiJson(request): ApiJson<UpdateFavoriteRequest>,
) -> ApiResult<Json<FavoriteResponse>> {
    let favorite = state
        .services
        .favorites
        .update(auth.user_id(), id, request)
        .await?;
    Ok(Json(favorite.into()))
}

/// DELETE `/favorites/{favorite_id}`
async fn delete_favorite(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<FavoriteId>,
) -> ApiResult<StatusCode> {
    state.services.favorites.delete(auth.user_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::test_support::TestApp;

    #[tokio::test]
    async fn test_favorite_lifecycle() {
        let app = TestApp::new();
        let (alice, _) = app.bank.open_account("Alice", 0).await;
        let (_, b) = app.bank.open_account("Bob", 0).await;
        let token = app.token(alice);

        let added = app
            .send(
                Method::POST,
                "/api/favorites",
                Some(&token),
                Some(json!({ "accountNumber": b.account_number.formatted(), "nickname": "Bobby" })),
            )
            .await;
        assert_eq!(added.status, StatusCode::CREATED);
        assert_eq!(added.body["accountOwnerName"], "Bob");
        let uri = format!("/api/favorites/{}", added.body["favoriteId"].as_str().unwrap());

        let updated = app
            .send(Method::PATCH, &uri, Some(&token), Some(json!({ "memo": "rent split" })))
            .await;
        assert_eq!(updated.body["nickname"], "Bobby");
        assert_eq!(updated.body["memo"], "rent split");

        let listed = app.send(Method::GET, "/api/favorites", Some(&token), None).await;
        assert_eq!(listed.body.as_array().unwrap().len(), 1);

        let deleted = app.send(Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(deleted.status, StatusCode::NO_CONTENT);
        let gone = app.send(Method::GET, &uri, Some(&token), None).await;
        assert_eq!(gone.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_other_users_favorite_is_not_found() {
        let app = TestApp::new();
        let (alice, _) = app.bank.open_account("Alice", 0).await;
        let (bob, _) = app.bank.open_account("Bob", 0).await;
        let (_, c) = app.bank.open_account("Carol", 0).await;

        let added = app
            .send(
                Method::POST,
                "/api/favorites",
                Some(&app.token(alice)),
                Some(json!({ "accountNumber": c.account_number.formatted(), "nickname": "C" })),
            )
            .await;
        let uri = format!("/api/favorites/{}", added.body["favoriteId"].as_str().unwrap());

        let response = app.send(Method::GET, &uri, Some(&app.token(bob)), None).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }
}
