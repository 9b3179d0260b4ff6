mod app;
mod auth;
mod config;
mod error;
mod pokemons;
mod state;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "pokedex_api=debug,axum=info,tower_http=info".to_string());
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

    let app_state = AppState::init().await?;

    if let Some(path) = app_state.config.seed_file.as_deref() {
        if let Err(e) = pokemons::seed::seed_from_file(app_state.pokemons.as_ref(), path).await {
            tracing::warn!(error = %e, "pokemon seed failed; continuing");
        }
    }

    app::serve(app::build_app(app_state)).await
}
