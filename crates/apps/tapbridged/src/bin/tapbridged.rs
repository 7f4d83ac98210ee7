use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tapbridge_daemon::{Bridge, BridgeConfig};
use tapbridge_rpc::StubHost;

#[derive(Parser, Debug)]
#[command(
    name = "tapbridged",
    version,
    about = "Loopback JSON-RPC bridge over captured HTTP traffic"
)]
struct Args {
    /// TOML config file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    port: Option<u16>,
    /// Shared secret clients must send as a bearer token.
    #[arg(long)]
    auth_token: Option<String>,
    /// Exchanges kept per domain before the oldest is evicted.
    #[arg(long)]
    max_requests: Option<usize>,
    /// Bytes kept per captured body.
    #[arg(long)]
    max_body_size: Option<usize>,
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> anyhow::Result<BridgeConfig> {
        let mut config = match &self.config {
            Some(path) => BridgeConfig::from_path(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => BridgeConfig::default(),
        };
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(token) = self.auth_token {
            config.auth_token = token;
        }
        if let Some(max) = self.max_requests {
            config.max_requests_per_domain = max;
        }
        if let Some(max) = self.max_body_size {
            config.max_body_size = max;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = args.into_config()?;
    if config.auth_token.is_empty() {
        log::warn!("tapbridged: no auth token set, any local process may connect");
    }

    let bridge = Bridge::start(config, Arc::new(StubHost)).await.context("starting bridge")?;
    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    log::info!("tapbridged: shutting down");
    bridge.shutdown().await;
    Ok(())
}
