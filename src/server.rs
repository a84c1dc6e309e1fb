//! Router and listener

use axum::{Router, routing};
use tokio::net::TcpListener;
use tracing::info;

use crate::SharedState;
use crate::api::handle_webhook;
use crate::config::ServerConfig;
use crate::error::{Result, ServerError};

/// `/webhook` takes every method so the handler can answer non-POST requests itself.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/webhook", routing::any(handle_webhook))
        .with_state(state)
}

/// Bind the configured port and serve until Ctrl-C or SIGTERM.
pub async fn serve(config: &ServerConfig, state: SharedState) -> Result<()> {
    let address = config.bind_address();
    let listener = TcpListener::bind(address)
        .await
        .map_err(|source| ServerError::BindFailed {
            address: address.to_string(),
            source,
        })?;

    info!("Webhook server listening on {}", address);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::ServeFailed)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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
    info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppState;
    use crate::registry::RepositoryRegistry;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    #[tokio::test]
    async fn other_paths_are_not_routed() {
        let state = AppState::new(&ServerConfig::default(), RepositoryRegistry::builtin());
        let response = router(Arc::new(state))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/deploy")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bind_failure_is_reported() {
        let taken = TcpListener::bind("0.0.0.0:0").await.unwrap();
        let config = ServerConfig {
            port: taken.local_addr().unwrap().port(),
            ..ServerConfig::default()
        };
        let state = AppState::new(&config, RepositoryRegistry::builtin());

        let err = serve(&config, Arc::new(state)).await.unwrap_err();
        assert!(matches!(err, ServerError::BindFailed { .. }));
    }
}
