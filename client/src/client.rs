use anyhow::Result;
use log::{error, info};

mod cltctx;
use cltctx::{ClientConfig, ClientContext};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn run() -> Result<()> {
    let config = ClientConfig::from_env();
    config.log_config();

    let mut context = ClientContext::connect(config)?;
    context.run(shutdown_signal()).await;
    context.stats().print_stats();
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
