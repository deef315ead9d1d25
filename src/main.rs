use std::sync::Arc;

use tokio::sync::Notify;

mod config;
mod error;
mod handler;
mod http;
mod logger;
mod product;
mod server;
mod store;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // First argument overrides the config file path (without extension)
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::Config::load_from(&config_path).map_err(error::StartupError::from)?;
    logger::init(&cfg.logging)?;

    // Create the Tokio runtime, sizing worker threads from config
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr).map_err(error::StartupError::from)?;

    let state = Arc::new(config::AppState::new(&cfg));
    let shutdown = Arc::new(Notify::new());
    server::start_signal_handler(Arc::clone(&shutdown))?;

    logger::log_server_start(&addr, &cfg);

    server::start_server_loop(listener, state, shutdown).await?;
    tracing::info!("server stopped");
    Ok(())
}
