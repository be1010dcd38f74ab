pub mod config;
pub mod error;
pub mod health;
pub mod progress;
pub mod scheduler;
pub mod state;
pub mod sweeper;
#[cfg(test)]
mod test_logs;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use notisweep_core::{NoiseFilter, NotificationApi};
use notisweep_github::GitHubClient;

use config::ServerConfig;
use error::StartupError;
use scheduler::{HourlySchedule, RunMode, spawn_scheduler, spawn_sweep};
use state::AppState;
use sweeper::Sweeper;

/// Build the health-check router. No other routes are served.
pub fn build_app(state: AppState) -> Router<()> {
    Router::new()
        .route("/health", axum::routing::get(health::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the triggers selected by `run_mode` for `sweeper`.
pub fn start_sweeps<A>(sweeper: &Arc<Sweeper<A>>, run_mode: RunMode, schedule: HourlySchedule)
where
    A: NotificationApi + 'static,
{
    if run_mode.runs_at_startup() {
        tracing::info!("Running startup sweep");
        spawn_sweep(Arc::clone(sweeper));
    }
    if run_mode.runs_on_timer() {
        spawn_scheduler(Arc::clone(sweeper), schedule);
    }
}

/// Wire the GitHub client, sweeper, triggers and health listener from a
/// validated config, then serve until Ctrl-C.
pub async fn run(config: ServerConfig) -> Result<(), StartupError> {
    let schedule = config.schedule()?;
    let client = GitHubClient::new(config.github_client_config()?)?;
    let sweeper = Arc::new(Sweeper::new(
        Arc::new(client),
        NoiseFilter::new(config.sweep.keyword.clone()),
        config.sweep_options(),
    ));

    tracing::info!(
        keyword = %config.sweep.keyword,
        mute = sweeper.options().mute_repositories,
        run_mode = ?config.schedule.run_mode,
        %schedule,
        "Notification sweeper configured"
    );

    start_sweeps(&sweeper, config.schedule.run_mode, schedule);

    let state = AppState::new(sweeper.status());
    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: addr.clone(),
            source,
        })?;
    tracing::info!("Health listener on {addr}");

    axum::serve(listener, build_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
