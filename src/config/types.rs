use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Minimum level for emitted log events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub blacklist: BlacklistConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_host_key_path")]
    pub host_key_path: PathBuf,
    /// Inline private key text. Never read from the file; only set from the environment.
    #[serde(skip)]
    pub host_key: Option<String>,
    #[serde(default = "default_server_id")]
    pub server_id: String,
    /// Upper bound on the wait for a shell or pty request before the report is written.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub auth_rejection_time_ms: u64,
    #[serde(default = "default_max_auth_attempts")]
    pub max_auth_attempts: usize,
    /// 0 disables the idle timeout.
    #[serde(default = "default_inactivity_timeout_secs")]
    pub inactivity_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            host_key_path: default_host_key_path(),
            host_key: None,
            server_id: default_server_id(),
            request_timeout_secs: default_request_timeout_secs(),
            auth_rejection_time_ms: 0,
            max_auth_attempts: default_max_auth_attempts(),
            inactivity_timeout_secs: default_inactivity_timeout_secs(),
        }
    }
}

fn default_listen() -> String {
    "localhost:2022".to_string()
}

fn default_host_key_path() -> PathBuf {
    PathBuf::from("host_key")
}

fn default_server_id() -> String {
    "SSH-2.0-keymirror".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

// Clients may carry dozens of keys; every one of them costs an attempt
fn default_max_auth_attempts() -> usize {
    64
}

fn default_inactivity_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BlacklistConfig {
    /// Directory of flat files, one canonical key per line.
    pub dir: Option<PathBuf>,
    /// Also tell the client which of its keys are blacklisted.
    #[serde(default)]
    pub warn_client: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}
