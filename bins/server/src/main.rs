//! CampusPay API Server
//!
//! Main entry point for the CampusPay ledger service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use campuspay_api::{AppState, create_router, events::DbNotifier, events::EventBus, gateway::PaystackClient};
use campuspay_db::connect_with_pool;
use campuspay_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campuspay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let db = connect_with_pool(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    let jwt_service = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expires_minutes: config.access_token_expires_minutes(),
    });

    let currency = config.currency().context("invalid gateway currency")?;
    let gateway = PaystackClient::new(&config.gateway)?;
    info!(
        base_url = %config.gateway.base_url,
        currency = %currency,
        "Payment gateway configured"
    );

    let events = Arc::new(EventBus::new(config.events.channel_capacity));
    let notifier = DbNotifier::new(db.clone(), Arc::clone(&events));

    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        gateway: Arc::new(gateway),
        gateway_config: Arc::new(config.gateway.clone()),
        currency,
        events,
        notifier: Arc::new(notifier),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
