//! Router assembly, tracing setup and the serve loop.

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use crate::config::ServerConfig;
use crate::routes::{auth, health, not_found, session, visits};
use crate::state::AppState;

/// Submissions wait on several external APIs in sequence.
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Installs the global subscriber and routes `log` records into it.
pub fn init_tracing(config: &ServerConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(&config.log_filter)
        .or_else(|_| EnvFilter::try_new(crate::config::DEFAULT_LOG_FILTER))?;

    if config.json_logs {
        let subscriber = Registry::default()
            .with(filter)
            .with(fmt::layer().json().with_target(true));
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default()
            .with(filter)
            .with(fmt::layer().with_target(false));
        tracing::subscriber::set_global_default(subscriber)?;
    }
    tracing_log::LogTracer::init()?;

    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let cors = if state.settings.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    let api = Router::new()
        .route("/api/session", post(session::create_session))
        .route("/api/session/{id}", delete(session::end_session))
        .route("/api/session/{id}/sites", get(session::search_sites))
        .route("/api/session/{id}/district", post(session::change_district))
        .route("/api/session/{id}/visits", post(visits::submit_visit))
        .route("/api/auth/status", get(auth::status))
        .route("/api/auth/sign-out", post(auth::sign_out))
        .layer(DefaultBodyLimit::max(state.settings.max_body_bytes));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(api)
        .fallback(not_found)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    log::info!("Loading configuration from {}", config.config_path.display());
    let visitlog_config = config.load()?;
    let state = AppState::from_config(&visitlog_config)?;

    let addr: SocketAddr = visitlog_config.server.bind_address.parse()?;
    let app = build_router(state);

    log::info!(
        "Starting visitlog server v{} on {} (CORS: {})",
        env!("CARGO_PKG_VERSION"),
        addr,
        visitlog_config.server.enable_cors
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => log::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => log::info!("Received SIGTERM, shutting down..."),
    }
}
