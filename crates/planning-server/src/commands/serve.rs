//! Serve command: publishes the feed over HTTP until SIGINT or SIGTERM.

use std::sync::Arc;

use planning_core::CalendarPipeline;
use planning_source::HttpSource;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::cli::ServeArgs;
use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::routes::{AppState, build_router};

/// Applies overrides in order: config file, `PORT`, then flags.
pub fn resolve_config(
    mut config: ServerConfig,
    args: &ServeArgs,
    port_env: Option<&str>,
) -> ServerResult<ServerConfig> {
    config.apply_port_env(port_env)?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref bind) = args.bind {
        config.server.bind = bind.clone();
    }
    config.validate()?;
    Ok(config)
}

pub async fn run(config: ServerConfig, args: &ServeArgs) -> ServerResult<()> {
    let port_env = std::env::var("PORT").ok();
    let config = resolve_config(config, args, port_env.as_deref())?;

    let pipeline = CalendarPipeline::new(config.pipeline.clone())?;
    let source = HttpSource::new(config.http_source_config()?)?;
    info!(
        url = %source.config().url,
        zone = pipeline.zone().id(),
        mode = %config.pipeline.output_mode,
        marker = %config.pipeline.marker,
        "Planning source configured"
    );

    let state = AppState::new(Arc::new(source), pipeline).with_horizon(config.horizon_months);
    let router = build_router(state, &config.server.route);

    let listener = TcpListener::bind(config.listen_addr()).await?;
    let addr = listener.local_addr()?;
    info!(
        %addr,
        route = %config.server.route,
        "Serveur ICS JR actif sur port {}",
        addr.port()
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on unix.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => info!("Received SIGINT, initiating shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating shutdown"),
    }
}
