pub mod api;
pub mod config;
pub mod db;
pub mod entities;
pub mod events;
pub mod mailer;
pub mod models;
pub mod services;
pub mod state;

use std::sync::Arc;
use tokio::signal;

use anyhow::Context;
pub use config::Config;
use services::Notifier;
use state::SharedState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    Config::create_default_if_missing()?;
    let config = Config::load()?;
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Docuvault v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let host = config.server.host.clone();
    let port = config.server.port;
    let sweep_interval = config.maintenance.token_sweep_interval_minutes;

    let shared = Arc::new(SharedState::new(config).await?);
    let state = api::create_app_state(shared.clone(), prometheus_handle);

    let notifier = Notifier::new(shared.mailer.clone(), shared.config.clone());
    let notifier_handle = notifier.start(&shared.event_bus);

    let sweeper_handle =
        services::maintenance::spawn_token_sweeper(shared.store.clone(), sweep_interval);

    let app = api::router(state).await;
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Web API running at http://{addr}");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    if let Err(e) = server.await {
        error!("Web server error: {e}");
    }

    notifier_handle.abort();
    if let Some(handle) = sweeper_handle {
        handle.abort();
    }

    info!("Docuvault stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) = signal::unix::signal(signal::unix::SignalKind::terminate()) {
            sig.recv().await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
