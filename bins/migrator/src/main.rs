//! Database migration runner for CampusPay.
//!
//! Usage:
//!   migrator up      - Run all pending migrations
//!   migrator down    - Rollback last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations
//!
//! Reads `DATABASE_URL`, falling back to `CAMPUSPAY__DATABASE__URL`.

use anyhow::{Context, bail};
use sea_orm_migration::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use campuspay_db::{connect, migration::Migrator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sea_orm_migration=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let command = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());
    let url = std::env::var("DATABASE_URL")
        .or_else(|_| std::env::var("CAMPUSPAY__DATABASE__URL"))
        .context("DATABASE_URL or CAMPUSPAY__DATABASE__URL must be set")?;
    let db = connect(&url).await?;

    match command.as_str() {
        "up" => Migrator::up(&db, None).await?,
        "down" => Migrator::down(&db, Some(1)).await?,
        "status" => Migrator::status(&db).await?,
        "fresh" => Migrator::fresh(&db).await?,
        other => bail!("unknown command `{other}`; expected up, down, status or fresh"),
    }

    Ok(())
}
