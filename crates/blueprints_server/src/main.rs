use anyhow::Context;
use blueprints_server::{build_pool, server, Config, ServerState};
use log::info;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::load()?;

    blueprints_core::init_logging(&config.logging.level, config.logging.directory.as_deref())
        .context("Failed to initialize logging")?;

    let pool = build_pool(&config.database)?;
    let state = Arc::new(ServerState::new(pool).context("Failed to build the router")?);

    let address = config.server.address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind `{address}`"))?;
    info!(
        "event=server_start module=server status=ok address={} version={}",
        address,
        blueprints_core::core_version()
    );

    server::serve(listener, state, server::shutdown_signal()).await;
    Ok(())
}
