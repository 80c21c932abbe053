use std::sync::Arc;

use documind::{app, config::AppConfig, state::AppState, storage, store::PgStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "documind=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    tracing::info!(addr = %config.bind_addr, storage = ?config.storage, "configuration loaded");

    let store = PgStore::connect(&config.database_url).await?;
    if let Err(e) = store.migrate().await {
        tracing::warn!(error = %e, "migration failed; continuing with existing schema");
    }

    let storage = storage::from_config(&config.storage).await?;
    let addr = config.bind_addr;
    let state = AppState::from_parts(config, Arc::new(store), storage)?;

    app::serve(app::build_app(state), addr).await
}
