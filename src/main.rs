mod app;
mod auth;
mod cars;
mod compensation;
mod config;
mod contact;
mod db;
mod error;
mod extract;
mod response;
mod state;
mod storage;
mod validation;

use crate::{app::build_app, config::AppConfig, db::Database, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "carrental=debug,axum=info,tower_http=info".to_string());
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
    tracing::info!(env = ?config.env, "configuration loaded");

    let db = Database::connect(&config.database_url).await?;
    if let Err(e) = db.migrate().await {
        tracing::warn!(error = %e, "migration failed; continuing");
    }

    let state = AppState::init(config.clone(), &db).await?;
    let app = build_app(state);
    let result = app::serve(app, &config).await;

    db.close().await;
    result
}
