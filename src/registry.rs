//! Repository name to deploy script lookup

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Repositories this server knows how to deploy
const BUILTIN_SCRIPTS: &[(&str, &str)] = &[
    ("0xhenrique-blog", "/srv/0xhenrique-blog/deploy.sh"),
    ("agora", "/srv/agora/deploy.sh"),
    ("agora-backend", "/srv/agora-backend/deploy.sh"),
];

/// Immutable mapping from repository name to the deploy script that handles it.
/// Built once at startup and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct RepositoryRegistry {
    scripts: HashMap<String, PathBuf>,
}

impl RepositoryRegistry {
    /// The compiled-in registry.
    pub fn builtin() -> Self {
        Self::from_entries(BUILTIN_SCRIPTS.iter().copied())
    }

    /// Later entries win when a name is repeated.
    pub fn from_entries<I, N, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: Into<PathBuf>,
    {
        Self {
            scripts: entries
                .into_iter()
                .map(|(name, path)| (name.into(), path.into()))
                .collect(),
        }
    }

    pub fn lookup(&self, repo_name: &str) -> Option<&Path> {
        self.scripts.get(repo_name).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}
