use std::path::PathBuf;

use clap::Parser;
use vchat_core::ConfigOverrides;
use vchat_core::Mode;

/// Chat with a locally hosted vision model from the terminal.
#[derive(Debug, Parser)]
#[command(name = "vchat", version)]
pub struct Cli {
    /// Backend address, e.g. http://localhost:5000
    #[arg(long = "base-url", value_name = "URL")]
    pub base_url: Option<String>,

    /// Inference mode sent with every message.
    #[arg(long = "mode", short = 'm', value_name = "best|text|image")]
    pub mode: Option<Mode>,

    /// Read settings from this file instead of $VCHAT_HOME/config.toml.
    #[arg(long = "config", short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Images to attach to the first message.
    #[arg(long = "image", short = 'i', value_name = "FILE")]
    pub images: Vec<PathBuf>,
}

impl Cli {
    pub fn config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            base_url: self.base_url.clone(),
            mode: self.mode,
            config_path: self.config.clone(),
        }
    }
}
