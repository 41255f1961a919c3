use std::sync::Arc;

use wof_reverse::config::{AppState, Config};
use wof_reverse::error::StoreError;
use wof_reverse::geocode::{ColumnWhitelist, DuckDbStore};
use wof_reverse::{logger, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load()?;
    logger::init(&cfg.logging).map_err(|e| e as Box<dyn std::error::Error>)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
        tracing::info!("Using {workers} worker threads");
    } else {
        tracing::info!("Using default worker threads (CPU cores)");
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    // The whitelist guards SQL construction; serving without it is not an option
    let (store, columns) = match open_dataset(&cfg) {
        Ok(opened) => opened,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to start server: cannot open dataset {}: {e}",
                cfg.dataset.path
            ));
            std::process::exit(1);
        }
    };

    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr)?;

    logger::log_server_start(&addr, &cfg, columns.len());

    let state = Arc::new(AppState::new(cfg, columns, Arc::new(store)));

    // Connections are served with spawn_local
    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::run_server_loop(
            listener,
            state,
            server::shutdown_signal(),
        ))
        .await
}

fn open_dataset(cfg: &Config) -> Result<(DuckDbStore, ColumnWhitelist), StoreError> {
    let store = DuckDbStore::open(&cfg.dataset)?;
    let columns = store.columns();
    Ok((store, columns))
}
