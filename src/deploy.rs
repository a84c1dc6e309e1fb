//! Running deploy scripts

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// Result of a deploy script that ran to completion
#[derive(Debug, Clone)]
pub struct DeployOutcome {
    /// `None` when the script was killed by a signal
    pub exit_code: Option<i32>,
    /// stdout followed by stderr
    pub output: Vec<u8>,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
}

impl DeployOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn output_lossy(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

/// The script could not be run to completion
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("failed to start {interpreter:?}: {source}")]
    Spawn {
        interpreter: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to collect deploy output: {0}")]
    Wait(#[source] io::Error),

    #[error("deploy script timed out after {0:?}")]
    TimedOut(Duration),
}

/// Executes a deploy script and reports how it went.
#[async_trait]
pub trait DeployInvoker: Send + Sync {
    async fn deploy(&self, script: &Path) -> Result<DeployOutcome, DeployError>;
}

/// Runs `<interpreter> <script>` with the server's own environment and working directory.
#[derive(Debug, Clone)]
pub struct ShellInvoker {
    interpreter: PathBuf,
    timeout: Option<Duration>,
}

impl ShellInvoker {
    pub fn new(interpreter: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            timeout: None,
        }
    }

    /// Kill the script if it runs longer than `timeout`. `None` waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl DeployInvoker for ShellInvoker {
    async fn deploy(&self, script: &Path) -> Result<DeployOutcome, DeployError> {
        debug!("Running: {} {}", self.interpreter.display(), script.display());

        let started_at = Utc::now();
        let start = Instant::now();

        let mut command = Command::new(&self.interpreter);
        command
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout takes down everything the script started
        #[cfg(unix)]
        command.process_group(0);

        let child = command.spawn().map_err(|source| DeployError::Spawn {
            interpreter: self.interpreter.clone(),
            source,
        })?;
        let pgid = child.id();
        let run = child.wait_with_output();

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(output) => output,
                Err(_) => {
                    kill_process_group(pgid);
                    return Err(DeployError::TimedOut(limit));
                }
            },
            None => run.await,
        }
        .map_err(DeployError::Wait)?;

        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);

        Ok(DeployOutcome {
            exit_code: output.status.code(),
            output: combined,
            started_at,
            duration: start.elapsed(),
        })
    }
}

#[cfg(unix)]
fn kill_process_group(pgid: Option<u32>) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Some(pgid) = pgid else {
        return;
    };
    // ESRCH only means the whole group already exited
    if let Err(e) = killpg(Pid::from_raw(pgid as i32), Signal::SIGKILL) {
        debug!("killpg({}) failed: {}", pgid, e);
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pgid: Option<u32>) {}
