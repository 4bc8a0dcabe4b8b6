//! Environment variable overrides, applied on top of the file (or defaults).
//!
//! Invalid values are ignored so a typo in the environment never prevents the
//! server from starting with its file configuration.

use crate::config::types::*;
use std::path::PathBuf;

pub const ENV_CONFIG: &str = "KEYMIRROR_CONFIG";
pub const ENV_LISTEN: &str = "KEYMIRROR_LISTEN";
pub const ENV_HOST_KEY: &str = "KEYMIRROR_HOST_KEY";
pub const ENV_HOST_KEY_PATH: &str = "KEYMIRROR_HOST_KEY_PATH";
pub const ENV_BLACKLIST_DIR: &str = "KEYMIRROR_BLACKLIST_DIR";
pub const ENV_BLACKLIST_WARN_CLIENT: &str = "KEYMIRROR_BLACKLIST_WARN_CLIENT";
pub const ENV_REQUEST_TIMEOUT: &str = "KEYMIRROR_REQUEST_TIMEOUT";
pub const ENV_LOG_LEVEL: &str = "KEYMIRROR_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "KEYMIRROR_LOG_FORMAT";

pub fn apply_env_overrides(config: &mut AppConfig) {
    if let Some(v) = opt_env(ENV_LISTEN) {
        config.server.listen = v;
    }
    if let Some(v) = opt_env(ENV_HOST_KEY) {
        config.server.host_key = Some(v);
    }
    if let Some(v) = opt_env(ENV_HOST_KEY_PATH) {
        config.server.host_key_path = PathBuf::from(v);
    }
    config.server.request_timeout_secs =
        parse_env(ENV_REQUEST_TIMEOUT, config.server.request_timeout_secs);

    if let Some(v) = opt_env(ENV_BLACKLIST_DIR) {
        config.blacklist.dir = Some(PathBuf::from(v));
    }
    config.blacklist.warn_client =
        parse_bool_env(ENV_BLACKLIST_WARN_CLIENT, config.blacklist.warn_client);

    if let Some(v) = opt_env(ENV_LOG_LEVEL) {
        if let Ok(level) = v.parse() {
            config.logging.level = level;
        }
    }
    if let Some(v) = opt_env(ENV_LOG_FORMAT) {
        if let Ok(format) = v.parse() {
            config.logging.format = format;
        }
    }
}

fn opt_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn parse_env<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    opt_env(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn parse_bool_env(key: &str, default: bool) -> bool {
    opt_env(key)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}
