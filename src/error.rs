//! Request and startup error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::io;

/// Every way a webhook request can end without a successful deploy.
/// The display text is the response body.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("Only POST allowed")]
    MethodNotAllowed,

    #[error("Invalid payload")]
    InvalidPayload,

    #[error("Unknown repository")]
    UnknownRepository,

    #[error("Deploy script not found")]
    ScriptNotFound,

    #[error("Deploy failed: {0}")]
    DeployFailed(String),
}

impl HookError {
    pub fn status(&self) -> StatusCode {
        match self {
            HookError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            HookError::InvalidPayload => StatusCode::BAD_REQUEST,
            HookError::UnknownRepository => StatusCode::NOT_FOUND,
            HookError::ScriptNotFound | HookError::DeployFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for HookError {
    fn into_response(self) -> Response {
        (self.status(), format!("{}\n", self)).into_response()
    }
}

/// Fatal errors that stop the server
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to bind {address}: {source}")]
    BindFailed {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("Server error: {0}")]
    ServeFailed(#[source] io::Error),

    #[error("Logging setup failed: {0}")]
    LoggingError(String),
}

pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(HookError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(HookError::InvalidPayload.status(), StatusCode::BAD_REQUEST);
        assert_eq!(HookError::UnknownRepository.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            HookError::ScriptNotFound.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            HookError::DeployFailed(String::new()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn deploy_failure_embeds_output() {
        let err = HookError::DeployFailed("build failed\n".into());
        assert_eq!(err.to_string(), "Deploy failed: build failed\n");
    }
}
