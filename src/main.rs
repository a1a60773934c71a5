use forum_web::config::Config;
use forum_web::database::{create_pool, run_migrations};
use forum_web::store::PgStore;
use forum_web::{AppState, create_app};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forum_web=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        tracing::error!("DATABASE_URL and JWT_SECRET must be set: {}", e);
        e
    })?;
    tracing::info!("Configuration loaded successfully");

    // Create database connection pool
    let db = create_pool(&config).await?;
    tracing::info!("Database connection pool created");

    // Run migrations
    run_migrations(&db).await?;
    tracing::info!("Database migrations completed");

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(Arc::new(PgStore::new(db)), config);

    // Create application
    let app = create_app(state);

    // Create listener
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Start server
    axum::serve(listener, app).await?;

    Ok(())
}
