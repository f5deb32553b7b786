use std::io::Write;

use clap::Parser;
use kapitalen_cli::{app, cli::Cli, config::AppConfig, logging};
use tracing::warn;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init_logging(cli.log_level.as_deref().unwrap_or("info"));
    let config = AppConfig::load(cli.config.as_deref())?;
    if cli.log_level.is_none() && std::env::var_os("RUST_LOG").is_none() {
        if let Err(e) = logging::set_log_level(&config.logging.level) {
            warn!("{e:#}");
        }
    }
    if let Some(path) = &config.logging.file {
        logging::enable_file_logging(path)?;
    }

    let output = app::run(cli, config).await?;
    std::io::stdout().write_all(output.as_bytes())?;
    Ok(())
}
