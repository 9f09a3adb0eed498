pub mod cli;
pub mod core;
pub mod providers;
pub mod server;

use crate::core::config::AppConfig;
use crate::core::{FanOutCoordinator, FanOutOptions, fund_list};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Print the report table once and exit.
    Console,
    /// Serve the report over HTTP.
    Server { port: u16 },
}

/// Runs one mode against an already resolved configuration and fund list path.
pub async fn run(mode: AppMode, config: &AppConfig, fund_list_path: &Path) -> Result<()> {
    info!("Fund estimate starting...");
    debug!("Loaded config: {config:#?}");

    let provider = Arc::new(providers::EastmoneyProvider::new(&config.provider)?);
    let coordinator = FanOutCoordinator::new(provider, FanOutOptions::from(&config.fetch));

    match mode {
        AppMode::Console => {
            let requests = fund_list::load_requests(fund_list_path)?;
            if requests.is_empty() {
                anyhow::bail!(
                    "No funds configured, add `identifier,weight` lines to {}",
                    fund_list_path.display()
                );
            }
            cli::console::run(&coordinator, &requests).await
        }
        AppMode::Server { port } => {
            let state = Arc::new(server::AppState {
                coordinator,
                fund_list: fund_list_path.to_path_buf(),
            });
            server::serve(state, port).await
        }
    }
}
