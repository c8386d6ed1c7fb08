use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rust_leads_api::config::{Config, StoreBackend};
use rust_leads_api::db::Database;
use rust_leads_api::db_storage::PgLeadStore;
use rust_leads_api::handlers::AppState;
use rust_leads_api::memory_store::InMemoryLeadStore;
use rust_leads_api::router::build_rate_limited_router;
use rust_leads_api::store::LeadStore;

/// Main entry point for the application.
///
/// This function initializes the application, including:
/// - Logging and tracing.
/// - Configuration loading.
/// - The lead store (PostgreSQL with migrations, or in-memory).
/// - HTTP routes and middleware (CORS, body limit, rate limiting).
///
/// It then starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_leads_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    let store: Arc<dyn LeadStore> = match config.store {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL required for the postgres store"))?;
            let db = Database::new(url, config.db_max_connections).await?;
            tracing::info!("Database connection pool established");
            Arc::new(PgLeadStore::new(db.pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory lead store; data is lost on restart");
            Arc::new(InMemoryLeadStore::new())
        }
    };

    // Build application state
    let app_state = Arc::new(AppState::new(store, config.clone()));
    let app = build_rate_limited_router(app_state)?;

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
