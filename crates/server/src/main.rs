mod api;
mod db;
mod router;
mod state;

#[cfg(test)]
mod api_tests;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use filepipe_core::Config;
use filepipe_queue::{
    Dispatcher, DispatcherConfig, DocumentSink, JobStore, ObjectStoreSource, SnapshotStore,
};
use filepipe_storage::{FileStore, StorageBackend};

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    filepipe_core::config::load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env();
    config.log_summary();

    std::fs::create_dir_all(&config.storage.data_dir)?;
    let backend = StorageBackend::from_config(&config.aws, &config.storage.data_dir)?;
    let files = Arc::new(FileStore::new(backend));

    let pool = db::init_pg_pool(&config.postgres).await;
    let sink: Arc<dyn DocumentSink> = Arc::new(db::PgSink::new(pool));

    let snapshot_path = config.jobs.state_path(&config.storage.data_dir);
    let store = Arc::new(JobStore::open(SnapshotStore::new(snapshot_path)));

    let dispatcher = Dispatcher::new(
        store,
        Arc::new(ObjectStoreSource::new(files.clone())),
        sink,
        DispatcherConfig {
            max_concurrent_jobs: config.jobs.max_concurrent_jobs,
            batch_size: config.jobs.batch_size,
            collection: config.postgres.table.clone(),
            temp_dir: config.storage.temp_dir.clone(),
        },
    );

    // Resume anything the snapshot restored into the pending queue.
    dispatcher.notify();

    let state = Arc::new(AppState {
        dispatcher,
        files,
        max_file_size: config.storage.max_file_size,
    });
    let app = router::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
