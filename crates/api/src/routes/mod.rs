//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth_middleware};

pub mod health;
pub mod housing;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod wallet;
pub mod withdrawals;
pub mod ws;

/// Creates the API router; protected routes get the auth middleware from `state`.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(wallet::routes())
        .merge(withdrawals::routes())
        .merge(orders::routes())
        .merge(housing::routes())
        .merge(payments::routes())
        .merge(notifications::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Public routes; the webhook checks its signature and the socket its token
    Router::new()
        .merge(health::routes())
        .merge(payments::webhook_routes())
        .merge(ws::routes())
        .merge(protected_routes)
}
