//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST routes for wallets, marketplace escrow, housing payments and top-ups
//! - Authentication middleware
//! - The payment gateway client
//! - The real-time event bus behind `/ws`

pub mod error;
pub mod events;
pub mod gateway;
pub mod middleware;
pub mod routes;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use campuspay_core::wallet::NotificationDispatcher;
use campuspay_shared::{GatewayConfig, JwtService, types::Currency};

use crate::events::EventBus;
use crate::gateway::PaymentGateway;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Payment gateway client.
    pub gateway: Arc<dyn PaymentGateway>,
    /// Gateway settings (webhook secret, callback URL).
    pub gateway_config: Arc<GatewayConfig>,
    /// Currency wallets are denominated in.
    pub currency: Currency,
    /// Real-time event bus.
    pub events: Arc<EventBus>,
    /// Notification dispatcher.
    pub notifier: Arc<dyn NotificationDispatcher>,
}

impl AppState {
    /// Cloned connection handle for a repository.
    #[must_use]
    pub fn conn(&self) -> DatabaseConnection {
        self.db.as_ref().clone()
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
