//! Per-repository deploy serialization

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

/// One lock per repository, so two pushes to the same repository never
/// run its deploy script at the same time. Disabled locks hand out nothing.
#[derive(Debug, Default)]
pub struct DeployLocks {
    enabled: bool,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl DeployLocks {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Wait until `repo_name` is free. Hold the returned guard for the whole deploy.
    pub async fn acquire(&self, repo_name: &str) -> Option<OwnedMutexGuard<()>> {
        if !self.enabled {
            return None;
        }

        let lock = {
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            Arc::clone(locks.entry(repo_name.to_string()).or_default())
        };

        Some(lock.lock_owned().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn disabled_locks_never_block() {
        let locks = DeployLocks::new(false);
        let first = locks.acquire("agora").await;
        let second = locks.acquire("agora").await;
        assert!(first.is_none());
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn same_repository_waits() {
        let locks = Arc::new(DeployLocks::new(true));
        let guard = locks.acquire("agora").await;
        assert!(guard.is_some());

        let waiting = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move { locks.acquire("agora").await.is_some() })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiting.is_finished());

        drop(guard);
        assert!(waiting.await.unwrap());
    }

    #[tokio::test]
    async fn different_repositories_do_not_wait() {
        let locks = DeployLocks::new(true);
        let _agora = locks.acquire("agora").await;
        let backend = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire("agora-backend"),
        )
        .await;
        assert!(backend.is_ok());
    }
}
