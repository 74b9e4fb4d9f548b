//! gridosc demo binary.
//!
//! Connects to serialosc, and runs the "hello" application on every grid it
//! announces: holding a key lights that key's row and column.  With
//! `--pages N` each grid is shared between N hello pages, switched with the
//! configured corner button.
//!
//! # Usage
//!
//! ```text
//! gridosc [OPTIONS]
//!
//! Options:
//!   --config <PATH>     TOML config file [default: gridosc.toml]
//!   --prefix <PREFIX>   OSC prefix for devices (overrides the config)
//!   --pages  <N>        Number of pages, 0 for none (overrides the config)
//!   --corner <CORNER>   Page-switch corner (overrides the config)
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable          | Description                     |
//! |-------------------|---------------------------------|
//! | `GRIDOSC_CONFIG`  | Config file path                |
//! | `GRIDOSC_PREFIX`  | OSC prefix                      |
//! | `GRIDOSC_PAGES`   | Number of pages                 |
//! | `GRIDOSC_CORNER`  | Page-switch corner              |
//! | `RUST_LOG`        | Log filter (overrides log_level)|

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gridosc::application::grid_client::GridApp;
use gridosc::application::hello::Hello;
use gridosc::application::pages::PageMultiplexer;
use gridosc::application::registry::AppFactory;
use gridosc::infrastructure::storage::config::{load_config, AppConfig};
use gridosc::infrastructure::transport::device::TokioConnector;
use gridosc::infrastructure::transport::discovery::{run_discovery, DiscoveryEndpoint};
use gridosc_core::{PageCorner, WILDCARD_ID};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Runs the hello demo on every attached grid.
#[derive(Debug, Parser)]
#[command(name = "gridosc", about = "Grid controller demo over serialosc", version)]
struct Cli {
    /// Path to the TOML configuration file.  A missing file means defaults.
    #[arg(long, default_value = "gridosc.toml", env = "GRIDOSC_CONFIG")]
    config: PathBuf,

    /// OSC prefix devices are told to use.
    #[arg(long, env = "GRIDOSC_PREFIX")]
    prefix: Option<String>,

    /// Number of hello pages per grid; 0 runs hello directly.
    #[arg(long, env = "GRIDOSC_PAGES")]
    pages: Option<usize>,

    /// Corner reserved for page switching.
    #[arg(long, env = "GRIDOSC_CORNER")]
    corner: Option<PageCorner>,
}

impl Cli {
    /// Loads the config file and applies the command-line overrides.
    fn into_config(self) -> anyhow::Result<AppConfig> {
        let mut config = load_config(&self.config)
            .with_context(|| format!("loading {}", self.config.display()))?;
        if let Some(prefix) = self.prefix {
            config.grid.prefix = prefix;
        }
        if let Some(pages) = self.pages {
            config.pages.count = pages;
        }
        if let Some(corner) = self.corner {
            config.pages.corner = corner;
        }
        Ok(config)
    }
}

/// Builds the factory every device is routed to.
fn hello_factory(config: &AppConfig) -> AppFactory {
    let pages = config.pages.count;
    let corner = config.pages.corner;
    if pages == 0 {
        return AppFactory::new(config.grid.prefix.clone(), || Box::new(Hello));
    }
    AppFactory::new(config.grid.prefix.clone(), move || {
        let apps: Vec<Box<dyn GridApp + Send>> =
            (0..pages).map(|_| Box::new(Hello) as Box<dyn GridApp + Send>).collect();
        Box::new(PageMultiplexer::new(apps, corner))
    })
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_config()?;

    // `RUST_LOG` wins; otherwise the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.grid.log_level)),
        )
        .init();

    info!(
        "gridosc starting: serialosc at {}:{}, prefix /{}, {} page(s), corner {}",
        config.serialosc.host,
        config.serialosc.port,
        config.grid.prefix,
        config.pages.count,
        config.pages.corner
    );

    let endpoint = DiscoveryEndpoint {
        bind_host: config.serialosc.bind_host.clone(),
        serialosc_host: config.serialosc.host.clone(),
        serialosc_port: config.serialosc.port,
    };
    let connector = TokioConnector::new(&config.serialosc.bind_host, &config.serialosc.host);
    let factories = vec![(WILDCARD_ID.to_string(), hello_factory(&config))];

    tokio::select! {
        result = run_discovery(&endpoint, factories, connector) => {
            result.context("serialosc discovery failed")?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl+C")?;
            info!("received Ctrl+C, shutting down");
        }
    }

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
