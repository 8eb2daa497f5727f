//! Runtime configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! environment/CLI overrides applied by the binary through `clap`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "https://api.resonite.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const CONFIG_DIR_NAME: &str = "reso-cli";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Client configuration. Every field has a default so a partial file is
/// enough.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Base URL of the service, without a trailing slash.
    pub api_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Group offered by the "manage record group" menu entry.
    pub group: GroupConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: concat!("reso-cli/", env!("CARGO_PKG_VERSION")).to_string(),
            group: GroupConfig::default(),
        }
    }
}

/// A name+path group pruned down to its newest record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GroupConfig {
    pub name: String,
    pub path: String,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            name: "Screens".to_string(),
            path: "Workspaces\\Private\\RadiantDash".to_string(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, the per-user file under
    /// the platform config directory is read when present, otherwise the
    /// defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply environment/CLI overrides. `None` keeps the current value.
    pub fn with_overrides(
        mut self,
        api_url: Option<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Self> {
        if let Some(url) = api_url {
            self.api_url = url;
        }
        if let Some(secs) = timeout_secs {
            self.timeout_secs = secs;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            bail!("api_url must not be empty");
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `api_url` with any trailing slash removed.
    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}

/// `<config_dir>/reso-cli/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}
