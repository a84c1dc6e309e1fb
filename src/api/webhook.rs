//! Webhook handler for push events

use axum::{
    body::Body,
    extract::State as AxumState,
    http::{Method, StatusCode},
};
use std::io::ErrorKind;
use std::path::Path;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::SharedState;
use crate::error::HookError;
use crate::webhook::{MAX_PAYLOAD_BYTES, WebhookPayload};

/// Handles a push notification: deploys the repository when the push is to
/// the primary branch, otherwise acknowledges and does nothing.
pub async fn handle_webhook(
    AxumState(state): AxumState<SharedState>,
    method: Method,
    body: Body,
) -> Result<(StatusCode, String), HookError> {
    if method != Method::POST {
        warn!("Rejected {} request", method);
        return Err(HookError::MethodNotAllowed);
    }

    // Read only after the method check so oversized non-POST bodies still get a 405
    let body = axum::body::to_bytes(body, MAX_PAYLOAD_BYTES)
        .await
        .map_err(|e| {
            warn!("Failed to read payload: {}", e);
            HookError::InvalidPayload
        })?;

    let payload = WebhookPayload::from_slice(&body).map_err(|e| {
        warn!("Failed to decode payload: {}", e);
        HookError::InvalidPayload
    })?;

    let branch = payload.branch();
    let repo_name = payload.repo_name();
    debug!("Received webhook: repo={}, branch={}", repo_name, branch);

    if branch != state.primary_branch {
        info!("Ignoring push to branch '{}' of '{}'", branch, repo_name);
        return Ok((StatusCode::OK, format!("Ignoring branch: {}\n", branch)));
    }

    let Some(script) = state.registry.lookup(repo_name) else {
        warn!("No deploy script configured for repo: {}", repo_name);
        return Err(HookError::UnknownRepository);
    };

    if script_missing(script).await {
        error!("Deploy script not found: {}", script.display());
        return Err(HookError::ScriptNotFound);
    }

    let deploy_id = Uuid::now_v7();
    let span = info_span!("deploy", %deploy_id, repo = %repo_name);
    run_deploy(&state, repo_name, script).instrument(span).await
}

/// Only a definite "not found" counts; other stat errors are left for the shell to report.
async fn script_missing(script: &Path) -> bool {
    matches!(
        tokio::fs::metadata(script).await,
        Err(e) if e.kind() == ErrorKind::NotFound
    )
}

async fn run_deploy(
    state: &SharedState,
    repo_name: &str,
    script: &Path,
) -> Result<(StatusCode, String), HookError> {
    let _guard = state.locks.acquire(repo_name).await;
    debug!("Executing deploy script: {}", script.display());

    match state.invoker.deploy(script).await {
        Ok(outcome) if outcome.success() => {
            info!(
                "Deploy successful for {} (started {}, took {:?})\nOutput: {}",
                repo_name,
                outcome.started_at.to_rfc3339(),
                outcome.duration,
                outcome.output_lossy()
            );
            Ok((StatusCode::OK, format!("Deploy successful for {}\n", repo_name)))
        }
        Ok(outcome) => {
            let output = outcome.output_lossy();
            error!(
                "Deploy failed for {} (started {}): exit code {:?}\nOutput: {}",
                repo_name,
                outcome.started_at.to_rfc3339(),
                outcome.exit_code,
                output
            );
            Err(HookError::DeployFailed(output))
        }
        Err(e) => {
            error!("Deploy failed for {}: {}", repo_name, e);
            Err(HookError::DeployFailed(e.to_string()))
        }
    }
}
