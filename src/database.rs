use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

use crate::config::Config;

/// Connection pool sized from `DATABASE_MAX_CONNECTIONS`; a quarter of the
/// connections are kept warm.
pub async fn create_pool(config: &Config) -> Result<PgPool, sqlx::Error> {
    let max_connections = config.database_max_connections;

    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections((max_connections / 4).max(1))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.database_url)
        .await
}

/// Applies `migrations/` (embedded at compile time).
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
