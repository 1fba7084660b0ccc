//! Server startup and lifecycle

use crate::{middleware, routes, AppState, GatewayConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

/// How often idle per-client rate limiter state is pruned
const RATE_LIMITER_CLEANUP_PERIOD: Duration = Duration::from_secs(60);

/// Run the gateway server
pub async fn run_server(config: GatewayConfig) -> anyhow::Result<()> {
    run_server_with_shutdown(config, std::future::pending()).await
}

/// Run server with graceful shutdown
pub async fn run_server_with_shutdown(
    config: GatewayConfig,
    shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    config.validate()?;

    let state = Arc::new(AppState::new(config.clone())?);
    let cleanup = middleware::spawn_rate_limiter_cleanup(
        state.rate_limiter.clone(),
        RATE_LIMITER_CLEANUP_PERIOD,
    );
    let app = routes::create_router(state);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;

    info!(
        "Sitegate listening on http://{}{}/storage",
        listener.local_addr()?,
        config.route_prefix()
    );

    // Client addresses feed the per-client rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal)
    .await?;

    cleanup.abort();

    info!("Gateway shutdown complete");

    Ok(())
}
