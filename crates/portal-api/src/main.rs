//! Study Portal API Server

use portal_api::create_router;
use portal_api::email::SmtpMailer;
use portal_api::state::AppState;
use portal_core::{AppConfig, Datastore, EmailSender, MemoryStore, PgStore};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal_api=debug,tower_http=debug".into()),
        )
        .init();

    // Load configuration
    let config = AppConfig::from_env().unwrap_or_default();
    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Storage backend: PostgreSQL when configured, otherwise ephemeral
    let store: Arc<dyn Datastore> = match &config.database.postgres_url {
        Some(url) => Arc::new(PgStore::new(url, config.database.pool_size).await?),
        None => {
            tracing::warn!("DATABASE_URL not set, using ephemeral in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let mailer: Arc<dyn EmailSender> = Arc::new(SmtpMailer::new(&config.email)?);

    // Create application state
    let state = Arc::new(AppState::new(config, store, mailer));

    // Create or repair the seeded admin account; the server still comes up
    // if this fails, admin login just stays broken until the store recovers
    if let Err(e) = state.accounts.ensure_admin(&state.config.bootstrap).await {
        tracing::error!(error = %e, "admin bootstrap failed");
    }

    // Create router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Study Portal API starting on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
