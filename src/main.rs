use nutrizap::app::{build_app, serve};
use nutrizap::chat::replies;
use nutrizap::reminders::{scheduler, service as reminder_service};
use nutrizap::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "nutrizap=debug,axum=info,tower_http=info".to_string());
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

    let state = AppState::init().await?;

    // Run migrations if present
    if let Err(e) = sqlx::migrate!("./migrations").run(&state.db).await {
        tracing::warn!(error = %e, "migrations folder not found or migration failed; continuing");
    }

    let armed = reminder_service::schedule_active(&state.db, &state.scheduler).await?;
    tracing::info!(armed, "stored reminders re-armed");

    let _greeting_job = scheduler::spawn_daily_greeting(
        state.db.clone(),
        state.sender.clone(),
        &state.config.greeting_time,
        replies::good_morning(),
    )?;

    serve(build_app(state)).await
}
