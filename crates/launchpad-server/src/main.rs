mod api;
mod middleware;
mod store;

use std::sync::Arc;
use std::time::Duration;

use launchpad_backend::{GenerativeBackend, OpenAiBackend};
use launchpad_core::TemplateSource;
use launchpad_pipeline::{Pipeline, ViewRevision};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};
use crate::store::{run_idle_sweep, SessionStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = launchpad_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let baseline = TemplateSource::from_path(config.template_path.clone()).read()?;
    let backend = OpenAiBackend::from_settings(&config.backend)?
        .map(|b| Arc::new(b) as Arc<dyn GenerativeBackend>);
    let pipeline = Arc::new(Pipeline::new(backend, ViewRevision::new()));

    let idle_ttl = Duration::from_secs(config.session_idle_secs);
    let sessions = Arc::new(SessionStore::new(config.max_sessions, idle_ttl));
    tokio::spawn(run_idle_sweep(Arc::clone(&sessions), idle_ttl / 4));

    let state = AppState::new(
        baseline,
        pipeline,
        Duration::from_millis(config.debounce_ms),
        sessions,
    );
    let app = build_app(state);

    tracing::info!(
        env = %config.env,
        bind_addr = %config.bind_addr,
        backend_enabled = config.backend.is_enabled(),
        max_sessions = config.max_sessions,
        "launchpad server listening"
    );
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
