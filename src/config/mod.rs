pub mod env;
pub mod types;

use anyhow::{Context, Result};
use std::path::Path;
use types::AppConfig;

/// Maximum config file size (1 MB)
const MAX_CONFIG_SIZE: u64 = 1_048_576;

/// Config file used when no path is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "keymirror.toml";

/// Bounds for `server.request_timeout_secs`.
pub const REQUEST_TIMEOUT_RANGE: std::ops::RangeInclusive<u64> = 1..=300;

/// Load and validate configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("reading config metadata: {}", path.display()))?;
    if metadata.len() > MAX_CONFIG_SIZE {
        anyhow::bail!(
            "config file too large: {} bytes (max {} bytes)",
            metadata.len(),
            MAX_CONFIG_SIZE
        );
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config: {}", path.display()))?;
    parse_config(&content)
}

/// Resolve the effective configuration: file (or defaults), then environment.
///
/// A missing file is only tolerated when `explicit` is false, i.e. the path is
/// the built-in default rather than one the operator asked for.
pub fn resolve_config(path: &Path, explicit: bool) -> Result<AppConfig> {
    let mut config = if !explicit && !path.exists() {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        AppConfig::default()
    } else {
        load_config(path)?
    };
    env::apply_env_overrides(&mut config);
    validate_config(&config)?;
    Ok(config)
}

/// Parse configuration from a TOML string
pub fn parse_config(content: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(content).context("parsing TOML configuration")?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    validate_server(config)?;
    Ok(())
}

fn validate_server(config: &AppConfig) -> Result<()> {
    let server = &config.server;
    if server.listen.is_empty() {
        anyhow::bail!("server.listen must not be empty");
    }
    if !server.server_id.starts_with("SSH-2.0-") {
        anyhow::bail!(
            "server.server_id must start with 'SSH-2.0-' (got '{}')",
            server.server_id
        );
    }
    if !REQUEST_TIMEOUT_RANGE.contains(&server.request_timeout_secs) {
        anyhow::bail!(
            "server.request_timeout_secs must be between {} and {} (got {})",
            REQUEST_TIMEOUT_RANGE.start(),
            REQUEST_TIMEOUT_RANGE.end(),
            server.request_timeout_secs
        );
    }
    if server.max_auth_attempts < 1 {
        anyhow::bail!("server.max_auth_attempts must be >= 1");
    }
    Ok(())
}
