//! Client configuration.
//!
//! Configuration can come from an optional YAML file (every field has a
//! default) with environment variables layered on top:
//!
//! - `OPENANIMAL_API_URL` -- base URL of the simulation API
//! - `OPENANIMAL_POLL_INTERVAL_SECS` -- seconds between synchronization passes
//! - `OPENANIMAL_IDENTITY_POLICY` -- `anonymous`, `optional`, or `required`
//! - `OPENANIMAL_STATE_DIR` -- directory for durable client state
//! - `OPENANIMAL_MIRROR_COOKIE` -- mirror the anonymous token into a cookie

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::identity::IdentityPolicy;

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Default seconds between synchronization passes.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 25;

/// Shortest accepted poll interval.
pub const MIN_POLL_INTERVAL_SECS: u64 = 1;

/// Longest accepted poll interval.
pub const MAX_POLL_INTERVAL_SECS: u64 = 300;

/// Complete client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the simulation API, without a trailing slash.
    pub api_url: String,
    /// Seconds between synchronization passes.
    pub poll_interval_secs: u64,
    /// Which identities may birth animals and own "your animals".
    pub identity_policy: IdentityPolicy,
    /// Directory holding the durable key/value file.
    pub state_dir: PathBuf,
    /// Whether to mirror the anonymous token into a cookie for the server.
    pub mirror_cookie: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            identity_policy: IdentityPolicy::default(),
            state_dir: PathBuf::from(".openanimal"),
            mirror_cookie: true,
        }
    }
}

impl ClientConfig {
    /// Defaults with environment overrides applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if an override does not parse or the
    /// result fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file, then apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is unusable.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment overrides.
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::from_file`], minus I/O.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// The poll interval as a [`Duration`].
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Path of the durable state file.
    pub fn state_file(&self) -> PathBuf {
        self.state_dir.join("state.json")
    }

    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_POLL_INTERVAL_SECS..=MAX_POLL_INTERVAL_SECS).contains(&self.poll_interval_secs) {
            return Err(ConfigError::Invalid(format!(
                "poll_interval_secs must be between {MIN_POLL_INTERVAL_SECS} and \
                 {MAX_POLL_INTERVAL_SECS}, got {}",
                self.poll_interval_secs
            )));
        }
        reqwest::Url::parse(&self.api_url)
            .map_err(|e| ConfigError::Invalid(format!("invalid api_url {}: {e}", self.api_url)))?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = lookup("OPENANIMAL_API_URL") {
            self.api_url = url.trim_end_matches('/').to_owned();
        }
        if let Some(secs) = lookup("OPENANIMAL_POLL_INTERVAL_SECS") {
            self.poll_interval_secs = secs.trim().parse().map_err(|e| {
                ConfigError::Invalid(format!("invalid OPENANIMAL_POLL_INTERVAL_SECS: {e}"))
            })?;
        }
        if let Some(policy) = lookup("OPENANIMAL_IDENTITY_POLICY") {
            self.identity_policy = IdentityPolicy::parse(&policy).ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "invalid OPENANIMAL_IDENTITY_POLICY: {policy} \
                     (expected anonymous, optional, or required)"
                ))
            })?;
        }
        if let Some(dir) = lookup("OPENANIMAL_STATE_DIR") {
            self.state_dir = PathBuf::from(dir);
        }
        if let Some(flag) = lookup("OPENANIMAL_MIRROR_COOKIE") {
            self.mirror_cookie = flag.trim().parse().map_err(|e| {
                ConfigError::Invalid(format!("invalid OPENANIMAL_MIRROR_COOKIE: {e}"))
            })?;
        }
        self.api_url = self.api_url.trim_end_matches('/').to_owned();
        Ok(())
    }
}
