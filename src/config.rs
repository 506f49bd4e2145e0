//! Configuration loaded from `config.toml` in the config directory.

use std::fs;
use std::path::Path;
use std::time::Duration;

use secrecy::{ExposeSecret, Secret, SecretString};
use serde::Deserialize;
use tracing::{debug, info};

use crate::environment::{get_env_var, SLACK_TOKEN_VAR};
use crate::error::{Error, Result};

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";

/// Per-request timeout for feed and detail page fetches.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Time the Slack directory needs after connecting before a recipient
/// reliably resolves.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub slack: SlackConfig,
    pub watch: WatchConfig,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    /// Bot token (`xoxb-...`).
    pub token: Option<SecretString>,
    pub api_base_url: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base_url: DEFAULT_SLACK_API_BASE.to_string(),
        }
    }
}

impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub request_timeout_secs: u64,
    pub settle_delay_secs: u64,
    pub user_agent: String,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            settle_delay_secs: DEFAULT_SETTLE_DELAY.as_secs(),
            user_agent: format!("{}/{}", crate::APP_NAME, env!("CARGO_PKG_VERSION")),
        }
    }
}

impl WatchConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    /// A zero timeout fails every request, and the settle delay may only be
    /// lengthened: sending sooner risks an unresolved recipient.
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(Error::config("watch.request_timeout_secs must be at least 1"));
        }
        if self.settle_delay() < DEFAULT_SETTLE_DELAY {
            return Err(Error::config(format!(
                "watch.settle_delay_secs must be at least {}",
                DEFAULT_SETTLE_DELAY.as_secs()
            )));
        }
        Ok(())
    }
}

/// Resolved credentials for one chat session.
#[derive(Clone)]
pub struct Credentials {
    pub token: SecretString,
    pub api_base_url: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

impl Config {
    /// Loads `config.toml` from `config_dir`. A missing file yields defaults so
    /// the token can come from the environment alone.
    pub fn load(config_dir: &Path) -> Result<Self> {
        let path = config_dir.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        debug!("Loading config from {}", path.display());
        let raw = fs::read_to_string(&path)?;
        Self::from_toml(&raw)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).map_err(Error::config)?;
        config.watch.validate()?;
        Ok(config)
    }

    /// Replaces the file token with `WYNWEATHER_SLACK_TOKEN` when it is set.
    pub fn apply_env_overrides(&mut self) {
        if let Some(token) = get_env_var(SLACK_TOKEN_VAR) {
            debug!("Using Slack token from {}", SLACK_TOKEN_VAR);
            self.slack.token = Some(Secret::new(token));
        }
    }

    pub fn credentials(&self) -> Result<Credentials> {
        let token = self
            .slack
            .token
            .as_ref()
            .filter(|token| !token.expose_secret().trim().is_empty())
            .ok_or_else(|| {
                Error::config(format!(
                    "no Slack token: set [slack] token in {} or {}",
                    CONFIG_FILE_NAME, SLACK_TOKEN_VAR
                ))
            })?;

        Ok(Credentials {
            token: token.clone(),
            api_base_url: self.slack.api_base_url.trim_end_matches('/').to_string(),
        })
    }
}
