#![warn(clippy::all, clippy::pedantic)]

use anyhow::Result;
use clap::Parser;
use riddlechat::Config;
use riddlechat::app::dispatch::dispatch;
use riddlechat::cli::Cli;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = Config::load_or_init()?;
    if let Some(base_url) = cli.base_url.clone() {
        config.transport.base_url = base_url;
        config.validate()?;
    }
    dispatch(cli, config).await
}
