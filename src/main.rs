mod app;
mod cli;
mod config;
mod db;
mod domain;
mod heuristics;
mod infrastructure;
mod pipeline;
mod web_content;

use anyhow::Result;
use clap::Parser;
use infrastructure::{directories, logging, shutdown};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = cli::Cli::parse();

    let config = config::load_config()?;
    let paths = directories::ensure_directories(&config.directories)?;
    logging::init_tracing(&config, &paths)?;

    let shutdown = shutdown::Shutdown::new();
    shutdown::install_signal_handlers(shutdown.clone());

    let app = app::PhishGuardApp::initialize(config, paths, shutdown).await?;
    app.run(cli.command).await
}
