// src/bin/fangscan-api.rs

use std::net::SocketAddr;

use color_eyre::eyre::{Result, WrapErr};
use tracing::info;

use fangscan::api::router;
use fangscan::config::ScanConfig;
use fangscan::logging::initialize_logging;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    initialize_logging(true)?;
    let config = ScanConfig::load()?;

    let addr: SocketAddr = format!("{}:{}", config.api_host, config.api_port)
        .parse()
        .wrap_err("invalid api_host/api_port")?;

    let app = router(config);
    info!(%addr, "FangScan API listening.");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;
    Ok(())
}
