use push_deploy_hook::AppState;
use push_deploy_hook::config::ServerConfig;
use push_deploy_hook::error::ServerError;
use push_deploy_hook::logging::{FileLogger, setup_logging};
use push_deploy_hook::registry::RepositoryRegistry;
use push_deploy_hook::server::serve;
use std::sync::Arc;
use tracing::info;

async fn run() -> Result<(), ServerError> {
    let config = ServerConfig::from_env()?;

    let file_logger = config.log_dir.clone().map(FileLogger::new);
    let _log_guard = setup_logging(file_logger.as_ref())?;

    let registry = RepositoryRegistry::builtin();
    info!(
        "{} repositories registered, deploying pushes to '{}' with {}",
        registry.len(),
        config.primary_branch,
        config.interpreter.display()
    );
    match config.deploy_timeout {
        Some(timeout) => info!("Deploy timeout: {:?}", timeout),
        None => info!("No deploy timeout set"),
    }
    if config.serialize_deploys {
        info!("Deploys of the same repository are serialized");
    }

    let state = Arc::new(AppState::new(&config, registry));
    serve(&config, state).await
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    if let Err(e) = run().await {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
