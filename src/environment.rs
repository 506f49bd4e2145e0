use std::env;
use std::path::PathBuf;

use crate::APP_NAME;

/// Environment variable that overrides the Slack token from `config.toml`.
pub const SLACK_TOKEN_VAR: &str = "WYNWEATHER_SLACK_TOKEN";

/// Retrieves an environment variable, treating an empty value as unset.
///
/// # Arguments
/// - `var`: The name of the environment variable.
///
/// # Returns
/// - `Option<String>`
pub fn get_env_var(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `$XDG_CONFIG_HOME/wynweather`, falling back to `~/.config/wynweather`.
pub fn default_config_dir() -> PathBuf {
    get_env_var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join(APP_NAME)
}

/// `$XDG_CACHE_HOME/wynweather`, falling back to `~/.cache/wynweather`.
pub fn default_cache_dir() -> PathBuf {
    get_env_var("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".cache")))
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join(APP_NAME)
}
