use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use rota::{Roster, RotaConfig, StorageKind, http_api, open_store};
use tracing_subscriber::EnvFilter;

/// Kitchen rota HTTP API.
#[derive(Parser, Debug)]
#[command(name = "rota-http", version, about)]
struct Cli {
    /// Optional TOML config file; environment variables override it.
    #[arg(long, env = "ROTA_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:3000.
    #[arg(long)]
    addr: Option<String>,

    /// Assignment data file.
    #[arg(long)]
    data: Option<PathBuf>,

    /// Storage backend (csv, json, sqlite, memory).
    #[arg(long)]
    storage: Option<StorageKind>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let base = match &cli.config {
        Some(path) => RotaConfig::from_toml_file(path)?,
        None => RotaConfig::default(),
    };
    let mut config = base.with_overrides(|key| std::env::var(key).ok())?;
    if let Some(addr) = cli.addr {
        config.http_addr = addr;
    }
    if let Some(data) = cli.data {
        config.data_path = data;
    }
    if let Some(storage) = cli.storage {
        config.storage = storage;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str())),
        )
        .init();

    let addr: SocketAddr = config
        .http_addr
        .parse()
        .with_context(|| format!("invalid listen address '{}'", config.http_addr))?;

    let roster = Roster::open(open_store(&config)?)?;
    tracing::info!(assignments = roster.book().len(), "loaded rota");
    http_api::serve(addr, roster).await?;
    Ok(())
}
