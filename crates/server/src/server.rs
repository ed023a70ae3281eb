//! Server initialization and routing
//!
//! This module handles the Axum server setup:
//! - Router configuration with all API endpoints
//! - Middleware stack (request id, logging, timeout, compression, CORS)
//! - Startup: logging, metrics, matcher bootstrap
//! - Graceful shutdown handling

use crate::config::AppConfig;
use crate::metrics::{install_recorder, PrometheusSearchMetrics};
use crate::middleware::{log_requests, request_id};
use crate::routes::{api_info, health, not_found, regions, search};
use crate::state::ServerState;
use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use matcher::{set_search_metrics, MedicineMatcher};
use std::sync::Arc;
use std::time::Instant;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum router with all routes and middleware
///
/// Middleware (outermost first): trace, request id, request logging, CORS,
/// compression, timeout, body limit.
pub fn build_router(state: Arc<ServerState>) -> Router {
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/", get(api_info))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics))
        .route("/medicines", get(search::search_medicines))
        .route("/nlp-search", post(search::nlp_search))
        .route("/regions", get(regions::list_regions))
        .route("/pharmacies", get(regions::list_pharmacies))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(state.config.max_body_size()))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.timeout(),
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the medicine search HTTP server
///
/// Blocks until SIGTERM or Ctrl+C. The catalog is loaded and the index built
/// (or read from cache) before the listener binds, so no request ever sees a
/// partially built index. Startup failures are returned and halt the process.
///
/// ```rust,no_run
/// use server::AppConfig;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = AppConfig::load()?;
///     server::start_server(config).await?;
///     Ok(())
/// }
/// ```
pub async fn start_server(config: AppConfig) -> anyhow::Result<()> {
    // A subscriber may already be installed by an embedding process.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(config.server.log_level.as_str())
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json()
        .try_init();

    let metrics = if config.server.metrics_enabled {
        let handle = install_recorder().context("failed to install Prometheus recorder")?;
        set_search_metrics(Some(Arc::new(PrometheusSearchMetrics)));
        Some(handle)
    } else {
        None
    };

    let start = Instant::now();
    let matcher = MedicineMatcher::bootstrap(&config.pipeline)
        .await
        .context("failed to build the medicine index")?;
    tracing::info!(
        entries = matcher.index().len(),
        model = matcher.index().model_name(),
        elapsed_micros = start.elapsed().as_micros(),
        "server_bootstrap_complete"
    );

    let mut state = ServerState::new(config.server.clone(), Arc::new(matcher));
    if let Some(handle) = metrics {
        state = state.with_metrics(handle);
    }
    let app = build_router(Arc::new(state));

    let addr = config.server.socket_addr()?;
    tracing::info!(
        addr = %addr,
        timeout_secs = config.server.timeout_secs,
        cors = config.server.enable_cors,
        metrics = config.server.metrics_enabled,
        "server_listening"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server_shutdown_complete");
    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!(signal = "ctrl_c", "shutdown_requested"),
        _ = terminate => tracing::info!(signal = "sigterm", "shutdown_requested"),
    }
}
