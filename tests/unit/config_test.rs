use keymirror::config::{self, types::LogLevel};
use tempfile::tempdir;

#[test]
fn missing_default_config_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    let config = config::resolve_config(&dir.path().join("keymirror.toml"), false).unwrap();
    assert_eq!(config.server.server_id, "SSH-2.0-keymirror");
    assert_eq!(config.server.request_timeout_secs, 30);
}

#[test]
fn missing_explicit_config_is_an_error() {
    let dir = tempdir().unwrap();
    assert!(config::resolve_config(&dir.path().join("custom.toml"), true).is_err());
}

#[test]
fn load_config_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("keymirror.toml");
    std::fs::write(
        &path,
        "[server]\nlisten = \"127.0.0.1:2200\"\nrequest_timeout_secs = 5\n\n[logging]\nlevel = \"warn\"\n",
    )
    .unwrap();

    let config = config::load_config(&path).unwrap();
    assert_eq!(config.server.listen, "127.0.0.1:2200");
    assert_eq!(config.server.request_timeout_secs, 5);
    assert_eq!(config.logging.level, LogLevel::Warn);
}

#[test]
fn oversized_config_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("huge.toml");
    let padding = "# padding\n".repeat(110_000);
    std::fs::write(&path, padding).unwrap();

    let err = config::load_config(&path).unwrap_err();
    assert!(err.to_string().contains("too large"));
}

#[test]
fn invalid_toml_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[server\nlisten = ").unwrap();
    assert!(config::load_config(&path).is_err());
}

#[test]
fn out_of_range_timeout_fails_validation() {
    for value in [0u64, 301, 10_000] {
        let toml = format!("[server]\nrequest_timeout_secs = {}\n", value);
        assert!(config::parse_config(&toml).is_err(), "{} accepted", value);
    }
    for value in [1u64, 300] {
        let toml = format!("[server]\nrequest_timeout_secs = {}\n", value);
        assert!(config::parse_config(&toml).is_ok(), "{} rejected", value);
    }
}

#[test]
fn bad_server_id_fails_validation() {
    assert!(config::parse_config("[server]\nserver_id = \"keymirror\"\n").is_err());
}
