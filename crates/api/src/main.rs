use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;

use tradewh_api::app::{build_app, AppServices};
use tradewh_infra::{AppConfig, PgExecutor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tradewh_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::debug!(database = ?config.database, "configuration loaded");

    let executor = PgExecutor::connect(&config.database)
        .await
        .context("failed to connect to Postgres")?;
    tracing::info!("database connection pool ready");

    let services = AppServices::new(Arc::new(executor.clone()), config.timeouts);
    let app = build_app(services, config.rate_limit);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, "listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    executor.close().await;
    tracing::info!("server exited");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutting down server");
}
