//! Layered configuration: built-in defaults, `$VCHAT_HOME/config.toml`,
//! the `VCHAT_BASE_URL` environment variable, then command-line overrides.

use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;
use tracing::info;
use vchat_backend_client::Mode;

use crate::error::ConfigError;
use crate::timeline::DEFAULT_GREETING;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_STATUS_TIMEOUT_MS: u64 = 10_000;
pub const BASE_URL_ENV_VAR: &str = "VCHAT_BASE_URL";
pub const HOME_ENV_VAR: &str = "VCHAT_HOME";

const CONFIG_TOML_FILE: &str = "config.toml";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Backend address without a trailing slash.
    pub base_url: String,
    pub mode: Mode,
    /// Bound on the health and model-list queries.
    pub status_timeout: Duration,
    pub greeting: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            mode: Mode::default(),
            status_timeout: Duration::from_millis(DEFAULT_STATUS_TIMEOUT_MS),
            greeting: DEFAULT_GREETING.to_string(),
        }
    }
}

/// On-disk shape of `config.toml`. Every key is optional.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct ConfigToml {
    pub base_url: Option<String>,
    pub mode: Option<String>,
    pub status_timeout_ms: Option<u64>,
    pub greeting: Option<String>,
}

/// Values supplied on the command line. They win over every other layer.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub mode: Option<Mode>,
    pub config_path: Option<PathBuf>,
}

impl Config {
    /// Resolve the configuration from the process environment.
    pub fn load(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let home = find_vchat_home();
        let env_base_url = std::env::var(BASE_URL_ENV_VAR).ok();
        match home {
            Ok(home) => Self::load_with(Some(&home), env_base_url, overrides),
            // A missing home only matters when no explicit file was given.
            Err(ConfigError::NoHome) if overrides.config_path.is_some() => {
                Self::load_with(None, env_base_url, overrides)
            }
            Err(err) => Err(err),
        }
    }

    pub fn load_with(
        vchat_home: Option<&Path>,
        env_base_url: Option<String>,
        overrides: ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let ConfigOverrides {
            base_url,
            mode,
            config_path,
        } = overrides;

        let file = match config_path {
            // An explicitly named file must exist.
            Some(path) => Some(read_config_toml(&path)?),
            None => match vchat_home {
                Some(home) => read_optional_config_toml(&home.join(CONFIG_TOML_FILE))?,
                None => None,
            },
        };

        let mut config = Config::default();
        if let Some(file) = file {
            config.apply_toml(file)?;
        }
        if let Some(url) = env_base_url.filter(|u| !u.trim().is_empty()) {
            config.base_url = url;
        }
        if let Some(url) = base_url {
            config.base_url = url;
        }
        if let Some(mode) = mode {
            config.mode = mode;
        }
        config.base_url = normalize_base_url(&config.base_url);
        debug!(?config, "resolved configuration");
        Ok(config)
    }

    fn apply_toml(&mut self, file: ConfigToml) -> Result<(), ConfigError> {
        if let Some(url) = file.base_url {
            self.base_url = url;
        }
        if let Some(mode) = file.mode {
            self.mode = Mode::from_str(mode.trim()).map_err(|_| ConfigError::InvalidMode(mode))?;
        }
        if let Some(ms) = file.status_timeout_ms {
            self.status_timeout = Duration::from_millis(ms);
        }
        if let Some(greeting) = file.greeting {
            self.greeting = greeting;
        }
        Ok(())
    }
}

/// `$VCHAT_HOME` when set, otherwise `~/.vchat`. The directory does not
/// have to exist.
pub fn find_vchat_home() -> Result<PathBuf, ConfigError> {
    if let Some(val) = std::env::var_os(HOME_ENV_VAR)
        && !val.is_empty()
    {
        return Ok(PathBuf::from(val));
    }
    let mut home = dirs::home_dir().ok_or(ConfigError::NoHome)?;
    home.push(".vchat");
    Ok(home)
}

pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn read_optional_config_toml(path: &Path) -> Result<Option<ConfigToml>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_config_toml(path, &contents).map(Some),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!("{} not found, using defaults", path.display());
            Ok(None)
        }
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn read_config_toml(path: &Path) -> Result<ConfigToml, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config_toml(path, &contents)
}

fn parse_config_toml(path: &Path, contents: &str) -> Result<ConfigToml, ConfigError> {
    toml::from_str(contents).map_err(|source| {
        tracing::error!("Failed to parse {}: {source}", path.display());
        ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        }
    })
}
