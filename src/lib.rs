pub mod api;
pub mod config;
pub mod deploy;
pub mod error;
pub mod locks;
pub mod logging;
pub mod registry;
pub mod server;
pub mod webhook;

use std::sync::Arc;

use config::ServerConfig;
use deploy::{DeployInvoker, ShellInvoker};
use locks::DeployLocks;
use registry::RepositoryRegistry;

/// Everything a request handler needs. Nothing in here changes after startup
/// except the contents of `locks`.
pub struct AppState {
    pub registry: RepositoryRegistry,
    pub invoker: Arc<dyn DeployInvoker>,
    pub locks: DeployLocks,
    pub primary_branch: String,
}

impl AppState {
    pub fn new(config: &ServerConfig, registry: RepositoryRegistry) -> Self {
        let invoker =
            ShellInvoker::new(config.interpreter.clone()).with_timeout(config.deploy_timeout);
        Self::with_invoker(config, registry, Arc::new(invoker))
    }

    /// Same as `new` but with a caller supplied invoker.
    pub fn with_invoker(
        config: &ServerConfig,
        registry: RepositoryRegistry,
        invoker: Arc<dyn DeployInvoker>,
    ) -> Self {
        Self {
            registry,
            invoker,
            locks: DeployLocks::new(config.serialize_deploys),
            primary_branch: config.primary_branch.clone(),
        }
    }
}

pub type SharedState = Arc<AppState>;
