#![deny(clippy::unwrap_used, clippy::expect_used)]

mod app;
mod cli;
mod commands;
mod render;
pub use cli::Cli;

use std::io::IsTerminal;

use tracing::info;
use tracing_subscriber::EnvFilter;
use vchat_backend_client::Client;
use vchat_core::Config;

use crate::app::App;
use crate::render::Styles;

/// Entry point for the `vchat` binary.
pub async fn run_main(cli: Cli) -> anyhow::Result<()> {
    let default_level = "error";
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .try_init();

    let config = Config::load(cli.config_overrides())?;
    info!(base_url = %config.base_url, mode = %config.mode, "starting vchat");

    let client = Client::new(config.base_url.clone())?
        .with_user_agent(format!("vchat/{}", env!("CARGO_PKG_VERSION")))
        .with_status_timeout(config.status_timeout);

    App::new(&config, client, Styles::detect())
        .run(cli.images)
        .await
}
