//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod health;
pub mod wallets;

/// Creates the `/api/v1` router; every route in it requires a bearer token.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(wallets::routes())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}
