//! `glimpse serve`: host the isolated-delivery endpoints.

use glimpse_config::ConfigDiscovery;
use std::net::SocketAddr;

use crate::cli::ServeArgs;
use crate::error::{CliError, Result};
use crate::server::PreviewServer;

pub async fn execute(args: ServeArgs) -> Result<()> {
    let config = ConfigDiscovery::new(&args.config_dir).load()?;
    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .map_err(|e| CliError::InvalidArgument(format!("bad address {}:{}: {e}", args.host, args.port)))?;

    let server = PreviewServer::new(&config.preview.marker_header)?;
    server.start(addr).await
}
