use anyhow::{anyhow, Result};
use clap::Parser;

use enterprize::{
    cli::{self, Cli, Command},
    config::Settings,
    middleware,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first
    let config = Settings::new()?;

    middleware::init_logging(&config.log_level, &config.log_format)
        .map_err(|e| anyhow!("failed to initialize logging: {}", e))?;

    tracing::info!("Starting Burp Enterprize v{}", env!("CARGO_PKG_VERSION"));

    cli::run(cli.command.unwrap_or(Command::Serve), config).await
}
