use anyhow::Result;
use clap::Parser;
use fundavg::AppMode;
use fundavg::core::config::AppConfig;
use fundavg::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Serve the report over HTTP instead of printing it
    #[arg(short, long)]
    server: bool,

    /// Port number, only used in server mode
    #[arg(short, long, default_value_t = 16000)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.server);

    let config = AppConfig::load()?;
    let fund_list = config.fund_list_path()?;

    let mode = if cli.server {
        AppMode::Server { port: cli.port }
    } else {
        AppMode::Console
    };

    let result = fundavg::run(mode, &config, &fund_list).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
