mod app;
mod auth;
mod config;
mod history;
mod images;
mod models;
mod openrouter;
mod recipes;
mod schedule;
mod state;
mod storage;
mod suggestions;

use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "hearth=debug,axum=info,tower_http=info".to_string());
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

    sqlx::migrate!("./migrations").run(&app_state.db).await?;

    auth::services::ensure_family_account(&app_state).await?;

    // Daily OpenRouter price-list sync; first run right away.
    models::sync::spawn_daily_sync(app_state.clone());

    let app = app::build_app(app_state);
    app::serve(app).await
}
