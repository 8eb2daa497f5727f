//! Entrypoint for the CLI application.
//! - Parse flags, load config, init logging.
//! - Log in once, then hand the session to the menu loop.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use reso_cli::{api::ApiClient, config::Config, logging, ui};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "reso-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Browse, search and prune your Resonite records", long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/reso-cli/config.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base URL of the API
    #[arg(long, env = "RESO_API_URL")]
    api_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "RESO_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(logging::level_for(cli.verbose), cli.json, cli.log_file.as_deref())?;

    let config = Config::load(cli.config.as_deref())?
        .with_overrides(cli.api_url, cli.timeout_secs)?;
    info!(api_url = %config.api_url, timeout_secs = config.timeout_secs, "starting");

    let api = ApiClient::from_config(&config)?;
    // Authentication failure is fatal to the run.
    let session = ui::login(&api).context("Login failed")?;

    // Blocks until the operator exits.
    ui::main_menu(&api, &session, &config)?;
    Ok(())
}
