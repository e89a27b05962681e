//! Configuration management for the branchmgr CLI.
//!
//! This module provides functionality for loading and validating the
//! configuration file of the branchmgr CLI application. It covers the GitHub
//! transport settings, the batch fan-out limit and the location of the
//! protection policy document.
//!
//! The configuration is stored in TOML format and can be loaded from a
//! specified file path or from the default location in the current directory.
//! Every setting is optional; a missing file means all defaults.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use github_client::{
    ClientSettings, DEFAULT_ACCEPT_HEADER, DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::errors::Error;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "branchmgr.toml";

/// Default per-call timeout, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = DEFAULT_REQUEST_TIMEOUT.as_secs();

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Main configuration structure for the branchmgr CLI application.
///
/// # Example TOML Configuration
///
/// ```toml
/// [github]
/// api_url = "https://api.github.com"
/// accept = "application/vnd.github+json"
/// timeout_secs = 30
///
/// [batch]
/// max_concurrency = 8
///
/// [policy]
/// path = "protection.toml" # relative to this file
/// ```
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// GitHub transport settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Batch protection settings
    #[serde(default)]
    pub batch: BatchConfig,

    /// Protection policy settings
    #[serde(default)]
    pub policy: PolicyConfig,
}

impl AppConfig {
    /// Loads configuration from a TOML file at the specified path.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path to the configuration file to load
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The specified file does not exist
    /// - The file cannot be read due to permissions or I/O issues
    /// - The file contains invalid TOML syntax
    /// - One of the values fails validation
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use std::path::Path;
    /// use branchmgr_cli::config::AppConfig;
    ///
    /// let config_path = Path::new("./branchmgr.toml");
    /// match AppConfig::load(&config_path) {
    ///     Ok(config) => println!("Timeout: {}s", config.github.timeout_secs),
    ///     Err(e) => eprintln!("Failed to load config: {}", e),
    /// }
    /// ```
    pub fn load(path: &Path) -> Result<Self, Error> {
        debug!("Loading configuration from {:?}", path);

        if !path.exists() {
            return Err(Error::Config(format!(
                "Configuration file not found: {:?}",
                path
            )));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read configuration file: {}", e)))?;

        let mut config: AppConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse configuration file: {}", e)))?;

        config.validate()?;
        config.anchor_relative_paths(path);

        info!("Configuration loaded from {:?}", path);
        Ok(config)
    }

    /// Loads the configuration the CLI should run with.
    ///
    /// # Behaviour
    ///
    /// - An explicit `config_path` must point at a readable, valid file
    /// - Without one, `./branchmgr.toml` is used if it exists
    /// - Otherwise all defaults apply
    pub fn load_or_default(config_path: Option<&str>) -> Result<Self, Error> {
        let path = get_config_path(config_path);

        if config_path.is_none() && !path.exists() {
            debug!("No configuration file found, using defaults");
            return Ok(Self::default());
        }

        Self::load(&path)
    }

    /// Resolves a relative `policy.path` against the directory holding the
    /// configuration file.
    fn anchor_relative_paths(&mut self, config_path: &Path) {
        if let (Some(policy), Some(base)) = (self.policy.path.as_mut(), config_path.parent()) {
            if policy.is_relative() {
                *policy = base.join(&*policy);
            }
        }
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<(), Error> {
        Url::parse(&self.github.api_url).map_err(|e| {
            Error::Config(format!(
                "github.api_url '{}' is not a valid URL: {}",
                self.github.api_url, e
            ))
        })?;

        if self.github.accept.trim().is_empty() {
            return Err(Error::Config("github.accept must not be empty".to_string()));
        }

        if self.github.timeout_secs == 0 {
            return Err(Error::Config(
                "github.timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.batch.max_concurrency == 0 {
            return Err(Error::Config(
                "batch.max_concurrency must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Settings for building the GitHub client.
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            api_url: self.github.api_url.clone(),
            accept: self.github.accept.clone(),
            request_timeout: Duration::from_secs(self.github.timeout_secs),
        }
    }
}

/// GitHub transport settings.
#[derive(Debug, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Base URI of the REST API.
    #[serde(default = "GitHubConfig::default_api_url")]
    pub api_url: String,

    /// Media type requested from the API.
    #[serde(default = "GitHubConfig::default_accept")]
    pub accept: String,

    /// Maximum duration of a single API call, in seconds.
    #[serde(default = "GitHubConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl GitHubConfig {
    fn default_api_url() -> String {
        DEFAULT_API_URL.to_string()
    }

    fn default_accept() -> String {
        DEFAULT_ACCEPT_HEADER.to_string()
    }

    fn default_timeout_secs() -> u64 {
        DEFAULT_TIMEOUT_SECS
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: GitHubConfig::default_api_url(),
            accept: GitHubConfig::default_accept(),
            timeout_secs: GitHubConfig::default_timeout_secs(),
        }
    }
}

/// Batch protection settings.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Maximum number of protection writes in flight at once.
    #[serde(default = "BatchConfig::default_max_concurrency")]
    pub max_concurrency: usize,
}

impl BatchConfig {
    fn default_max_concurrency() -> usize {
        branchmgr_core::DEFAULT_MAX_CONCURRENCY
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: BatchConfig::default_max_concurrency(),
        }
    }
}

/// Protection policy settings.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Policy document applied by `protect`. The built-in policy is used when unset.
    ///
    /// A relative path is resolved against the directory of the configuration
    /// file it was read from.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Resolves the path to the configuration file.
///
/// # Behaviour
///
/// - If `config_path` is `Some(path)`, returns that path as a `PathBuf`
/// - If `config_path` is `None`, returns `./branchmgr.toml` in the current directory
/// - Falls back to the current directory if unable to determine the working directory
pub fn get_config_path(config_path: Option<&str>) -> PathBuf {
    if let Some(path) = config_path {
        PathBuf::from(path)
    } else {
        let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        current_dir.join(DEFAULT_CONFIG_FILENAME)
    }
}
