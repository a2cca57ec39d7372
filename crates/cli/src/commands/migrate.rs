//! Database migration command.
//!
//! Applies the migrations embedded from `crates/server/migrations/`: the
//! `account` schema and the `tower_sessions` table.
//!
//! # Environment Variables
//!
//! - `PLATED_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

use plated_server::db::create_pool;

use super::{CommandError, database_url};

/// Run all pending migrations.
pub async fn run() -> Result<(), CommandError> {
    let url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(&url).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
