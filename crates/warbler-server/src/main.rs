mod config;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use warbler_api::{AppStateInner, router, session_layer};
use warbler_crypto::Argon2Hasher;
use warbler_db::Database;

use crate::config::{Config, DEFAULT_LOG_FILTER};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = Database::connect(&config.database_url)?;

    // Shared state
    let state = AppStateInner::new(db, Argon2Hasher::default());

    let sessions = session_layer(
        config.session_secure,
        time::Duration::minutes(i64::from(config.session_idle_minutes)),
    );

    let app = router(state)
        .layer(sessions)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("Warbler server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
