use anyhow::Result;
use log::{error, info};

mod srvctx;
use srvctx::{ServerConfig, ServerContext};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn run() -> Result<()> {
    let context = ServerContext::new(ServerConfig::from_env())?;
    context.log_config();

    let listener = context.bind().await?;
    context.serve(listener, shutdown_signal()).await
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
