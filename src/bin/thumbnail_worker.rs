use std::time::Duration;

use tracing::{error, info};

use files_manager::logging::{self, WORKER_PROCESS};
use files_manager::{Config, Database, JobQueue, ThumbnailProcessor, ThumbnailWorker};

#[tokio::main]
async fn main() {
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

    if let Err(e) = logging::init(&config.logging, WORKER_PROCESS) {
        eprintln!("Failed to initialize logging: {e}");
        logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = run(config).await {
        error!("Thumbnail worker failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> files_manager::Result<()> {
    config.validate()?;

    let db = Database::open(&config.database.path).await?;
    let queue = JobQueue::new(db.clone(), &config.queue.name)
        .with_stall_timeout(Duration::from_secs(config.queue.stall_timeout_secs));
    let worker = ThumbnailWorker::new(
        queue,
        ThumbnailProcessor::new(db.clone()),
        Duration::from_millis(config.queue.poll_interval_ms),
    );

    worker
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Received shutdown signal");
        })
        .await?;

    db.close().await;
    Ok(())
}
