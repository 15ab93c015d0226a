//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth_middleware};

pub mod accounts;
pub mod favorites;
pub mod health;
pub mod notifications;
pub mod schedules;
pub mod simple_password;
pub mod transactions;
pub mod transfers;

/// Creates the API router: `/health` is public, everything else needs a
/// bearer token.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(accounts::routes())
        .merge(simple_password::routes())
        .merge(transfers::routes())
        .merge(schedules::routes())
        .merge(transactions::routes())
        .merge(favorites::routes())
        .merge(notifications::routes())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}
