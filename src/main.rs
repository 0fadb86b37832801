use std::time::Duration;

use tracing::{error, info};

use files_manager::logging::{self, SERVER_PROCESS};
use files_manager::web::{AppState, WebServer};
use files_manager::{cache, Config, Database, FileStorage, JobQueue};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = logging::init(&config.logging, SERVER_PROCESS) {
        eprintln!("Failed to initialize logging: {e}");
        logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = run(config).await {
        error!("Server failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> files_manager::Result<()> {
    config.validate()?;

    let db = Database::open(&config.database.path).await?;
    let tokens = cache::connect(&config.cache).await?;
    let storage = FileStorage::new(&config.files.storage_path);
    storage.ensure_base_dir().await?;
    let queue = JobQueue::new(db.clone(), &config.queue.name)
        .with_stall_timeout(Duration::from_secs(config.queue.stall_timeout_secs));

    info!("Storing files under {}", storage.base_path().display());

    let state = AppState::new(db.clone(), tokens, storage, queue);
    WebServer::new(&config.server, state)?
        .run(shutdown_signal())
        .await?;

    db.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
