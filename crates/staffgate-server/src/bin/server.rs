//! StaffGate Server Binary

use anyhow::Result;
use staffgate_common_log::LogConfig;
use staffgate_server::{config::load_config, Server};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    staffgate_common_log::init(LogConfig::from_env())?;

    let config = load_config()?;

    info!("Starting StaffGate Server v{}", env!("CARGO_PKG_VERSION"));

    let server = Server::new(config)?;
    server.run().await?;

    info!("Server shutdown complete");
    Ok(())
}
