//! Application configuration
//!
//! The configuration file is found using the following precedence:
//! 1. `HERALD_CONFIG` environment variable
//! 2. `./herald.config.ron` (current working directory)
//! 3. `/etc/herald/herald.config.ron` (system-wide config)
//!
//! `HERALD_BOT_TOKEN`, when set, replaces the configured bot token.

use std::path::{Path, PathBuf};

use herald_broadcast::BroadcastConfig;
use herald_common::config::{self, ConfigError, ConfigLocator};
use herald_telegram::TelegramConfig;
use serde::{Deserialize, Serialize};

pub const CONFIG_ENV: &str = "HERALD_CONFIG";
pub const TOKEN_ENV: &str = "HERALD_BOT_TOKEN";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeraldConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub broadcast: BroadcastConfig,

    /// File that blocked recipient ids are appended to, one per line
    #[serde(default)]
    pub blocked_file: Option<PathBuf>,
}

impl HeraldConfig {
    /// Load the configuration for a run from `explicit`, or from the first
    /// default location that exists.
    ///
    /// A dry run falls back to built-in defaults when no file exists, since
    /// it never talks to the Bot API.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be found, read or parsed, or if no
    /// bot token is available for a real run.
    pub fn load(explicit: Option<&Path>, dry_run: bool) -> anyhow::Result<Self> {
        let located = explicit.map_or_else(
            || {
                ConfigLocator::new(CONFIG_ENV)
                    .with_candidate("./herald.config.ron")
                    .with_candidate("/etc/herald/herald.config.ron")
                    .locate()
            },
            |path| Ok(path.to_path_buf()),
        );

        Self::resolve(located, std::env::var(TOKEN_ENV).ok(), dry_run)
    }

    fn resolve(
        located: Result<PathBuf, ConfigError>,
        token_override: Option<String>,
        dry_run: bool,
    ) -> anyhow::Result<Self> {
        let mut config = match located {
            Ok(path) => Self::from_file(&path)?,
            Err(ConfigError::NotFound { .. }) if dry_run => {
                tracing::info!("No configuration file found, using defaults for dry run");
                Self::default()
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(token) = token_override.filter(|token| !token.trim().is_empty()) {
            config.telegram.token = token.trim().to_owned();
        }

        if !dry_run && config.telegram.token.is_empty() {
            anyhow::bail!("No bot token configured; set telegram.token or {TOKEN_ENV}");
        }

        config.broadcast.validate()?;

        Ok(config)
    }

    /// Load a specific configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = config::load(path)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }
}
