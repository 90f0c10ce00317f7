mod ads;
mod app;
mod auth;
mod config;
mod error;
mod extract;
mod policy;
mod state;
mod store;
mod users;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "adboard=debug,axum=info,tower_http=info".to_string());
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

    // Refuses to start without a signing secret.
    let config = AppConfig::from_env()?;
    match config.jwt.ttl_minutes {
        Some(ttl) => tracing::info!(ttl_minutes = ttl, "tokens expire"),
        None => tracing::warn!("JWT_TTL_MINUTES not set; issued tokens never expire"),
    }

    let state = AppState::init(config).await?;
    let config = state.config.clone();
    let app = app::build_app(state);

    app::serve(app, &config).await
}
