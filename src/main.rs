use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use draft_room::config::Config;
use draft_room::db::{self, SqliteStore};
use draft_room::routes;
use draft_room::services::auth_user::JwtSecret;
use draft_room::services::coordinator::DraftCoordinator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().context("Invalid configuration")?;

    if let Some(file) = config.database_url.strip_prefix("sqlite://") {
        if let Some(dir) = Path::new(file).parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).with_context(|| format!("Could not create {}", dir.display()))?;
        }
    }

    let pool = db::connect(&config.database_url)
        .await
        .context("Could not connect to SQLite")?;
    info!("Connected to sqlite database.");

    let store = SqliteStore::new(pool);
    let coordinator = DraftCoordinator::new(Arc::new(store.clone()), config.draft.clone());

    if let Err(e) = coordinator.resume_drafts().await {
        error!("Failed to resume drafts in progress: {}", e);
    }

    let app = routes::app(coordinator, store, JwtSecret(config.jwt_secret.clone()));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Could not bind {}", config.bind_addr))?;
    info!("Started server on {}.", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
