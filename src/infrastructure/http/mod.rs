pub mod request_id;

use axum::{middleware, routing::get, Router};
use std::future::Future;
use std::io::ErrorKind;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::controllers::{gateway::GatewayController, health};
use crate::error::{AppError, AppResult};
use crate::infrastructure::config::Config;
use crate::infrastructure::gateway::ConnectionRegistry;

pub use request_id::{request_id_middleware, RequestId, X_REQUEST_ID};

/// Assemble every route the gateway serves
pub fn build_router(
    gateway_controller: Arc<GatewayController>,
    registry: Arc<ConnectionRegistry>,
) -> Router {
    // Persistent relay connection
    let gateway_routes = Router::new()
        .route("/ws", get(GatewayController::connect))
        .with_state(gateway_controller);

    // Liveness (public)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/api/health", get(health::probe))
        .with_state(registry);

    Router::new()
        .merge(health_routes)
        .merge(gateway_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware)),
        )
}

/// Bind `host:port`, moving to the next port while the address is taken
pub async fn bind_with_fallback(host: &str, port: u16, attempts: u16) -> AppResult<TcpListener> {
    if port == 0 {
        return Ok(TcpListener::bind((host, 0)).await?);
    }

    let last = port.saturating_add(attempts);
    for candidate in port..=last {
        match TcpListener::bind((host, candidate)).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == ErrorKind::AddrInUse => {
                tracing::warn!(port = candidate, "Address in use, trying next port");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::Internal(format!(
        "no free port between {} and {}",
        port, last
    )))
}

/// Start the HTTP server and serve until a termination signal arrives
pub async fn start_http_server(
    config: Arc<Config>,
    app: Router,
    registry: Arc<ConnectionRegistry>,
) -> AppResult<()> {
    let listener =
        bind_with_fallback(&config.host, config.port, config.port_fallback_attempts).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    serve_until(listener, app, registry, termination_signal()).await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Serve `app` until `signal` resolves, closing every relay connection before
/// the listener stops
pub async fn serve_until<F>(
    listener: TcpListener,
    app: Router,
    registry: Arc<ConnectionRegistry>,
    signal: F,
) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            signal.await;
            let closed = registry.begin_shutdown();
            tracing::info!(connections_closed = closed, "Shutdown signal received");
        })
        .await?;
    Ok(())
}

/// Resolves on ctrl-c or SIGTERM
async fn termination_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
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
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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
}
