//! HTTP 表層（axum）
//!
//! | Method & Path          | Auth      | Success          |
//! |------------------------|-----------|------------------|
//! | `GET /`                | none      | 200 liveness     |
//! | `POST /tasks`          | X-API-Key | 200 Ack          |
//! | `POST /results`        | X-API-Key | 204              |
//! | `GET /status/{task_id}`| X-API-Key | 200 stored result|

pub mod auth;
pub mod error;
pub mod handlers;

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::app::{BuildError, Gateway, GatewayBuilder, GatewayConfig};
use crate::domain::AgentId;

pub fn router(gateway: Arc<Gateway>) -> Router {
    let protected = Router::new()
        .route("/tasks", post(handlers::submit_task))
        .route("/results", post(handlers::push_result))
        .route("/status/{task_id}", get(handlers::get_status))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&gateway),
            auth::require_api_key,
        ));

    Router::new()
        .route("/", get(handlers::liveness))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .with_state(gateway)
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// `config` からゲートウェイを構築し、`shutdown` が解決するまで serve する。
///
/// 停止後は ForwardPool を止める。実行中の配送は待ち、未開始の配送は捨てる。
pub async fn run(
    config: GatewayConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), RunError> {
    config.warn_on_placeholders();

    let app = GatewayBuilder::from_config(&config)?
        .expect_agents(&AgentId::ALL)
        .build()?;

    let listener = TcpListener::bind(config.bind_addr.as_str())
        .await
        .map_err(|source| RunError::Bind {
            addr: config.bind_addr.clone(),
            source,
        })?;
    tracing::info!(
        addr = %config.bind_addr,
        forward_concurrency = app.forwards.per_agent_limit(),
        timeout = ?config.forward_timeout,
        "gateway listening"
    );

    let served = axum::serve(listener, router(app.gateway))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(RunError::Serve);

    app.forwards.shutdown_and_join().await;
    tracing::info!("gateway stopped");
    served
}

/// Ctrl-C（unix では SIGTERM も）で解決する。
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to listen for SIGTERM");
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
    tracing::info!("shutdown requested");
}
