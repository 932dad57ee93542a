//! Configuration file discovery and loading.
//!
//! A file is located by checking, in order, an environment variable override
//! and then a list of well-known paths. The first existing file wins.

use std::{
    io,
    path::{Path, PathBuf},
};

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} points to non-existent file: {}", path.display())]
    MissingOverride { var: &'static str, path: PathBuf },

    #[error("No configuration file found. Tried:\n  - {var} environment variable\n{tried}")]
    NotFound { var: &'static str, tried: String },

    #[error("Failed to read config from {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config from {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

/// Finds a configuration file from an environment override or default paths
#[derive(Debug, Clone)]
pub struct ConfigLocator {
    env_var: &'static str,
    candidates: Vec<PathBuf>,
}

impl ConfigLocator {
    #[must_use]
    pub const fn new(env_var: &'static str) -> Self {
        Self {
            env_var,
            candidates: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_candidate(mut self, path: impl Into<PathBuf>) -> Self {
        self.candidates.push(path.into());
        self
    }

    /// Locate the configuration file using the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the override points to a missing file, or if no
    /// candidate path exists.
    pub fn locate(&self) -> Result<PathBuf, ConfigError> {
        self.locate_with(std::env::var(self.env_var).ok())
    }

    fn locate_with(&self, override_path: Option<String>) -> Result<PathBuf, ConfigError> {
        if let Some(path) = override_path {
            let path = PathBuf::from(path);
            if path.exists() {
                return Ok(path);
            }
            return Err(ConfigError::MissingOverride {
                var: self.env_var,
                path,
            });
        }

        if let Some(found) = self.candidates.iter().find(|path| path.exists()) {
            return Ok(found.clone());
        }

        let tried = self
            .candidates
            .iter()
            .map(|p| format!("  - {}", p.display()))
            .collect::<Vec<_>>()
            .join("\n");

        Err(ConfigError::NotFound {
            var: self.env_var,
            tried,
        })
    }
}

/// Read and deserialize a RON configuration file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid for `T`.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    ron::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
