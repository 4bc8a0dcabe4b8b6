use crate::config::types::ServerConfig;
use anyhow::{Context, Result};
use russh::keys::{Algorithm, PrivateKey};
use std::path::Path;
use tracing::info;

/// Host key for the server: inline key text wins over the key file.
pub fn resolve_host_key(server: &ServerConfig) -> Result<PrivateKey> {
    match &server.host_key {
        Some(text) => {
            let key = decode_host_key(text).context("decoding inline host key")?;
            info!("Host key loaded from environment");
            Ok(key)
        }
        None => {
            let key = load_or_generate_host_key(&server.host_key_path)?;
            info!(path = %server.host_key_path.display(), "Host key loaded");
            Ok(key)
        }
    }
}

/// Load or generate an Ed25519 host key
pub fn load_or_generate_host_key(path: &Path) -> Result<PrivateKey> {
    if path.exists() {
        load_host_key(path)
    } else {
        let key = generate_host_key()?;
        save_host_key(&key, path)?;
        info!(path = %path.display(), "Generated new Ed25519 host key");
        Ok(key)
    }
}

fn load_host_key(path: &Path) -> Result<PrivateKey> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading host key: {}", path.display()))?;
    decode_host_key(&text).with_context(|| format!("decoding host key: {}", path.display()))
}

/// Decode PEM or OpenSSH private key text (unencrypted).
pub fn decode_host_key(text: &str) -> Result<PrivateKey> {
    russh::keys::decode_secret_key(text.trim(), None).map_err(|e| anyhow::anyhow!("{}", e))
}

fn generate_host_key() -> Result<PrivateKey> {
    PrivateKey::random(&mut rand::rngs::OsRng, Algorithm::Ed25519)
        .map_err(|e| anyhow::anyhow!("Ed25519 key generation failed: {}", e))
}

fn save_host_key(key: &PrivateKey, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory: {}", parent.display()))?;
        }
    }

    let mut buf = Vec::new();
    russh::keys::encode_pkcs8_pem(key, &mut buf)
        .map_err(|e| anyhow::anyhow!("encoding host key: {}", e))?;

    // Created with 0600 directly, never widened afterwards
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .with_context(|| format!("creating host key file: {}", path.display()))?;
        file.write_all(&buf)
            .with_context(|| format!("writing host key: {}", path.display()))?;
    }

    #[cfg(not(unix))]
    {
        std::fs::write(path, &buf)
            .with_context(|| format!("writing host key: {}", path.display()))?;
    }

    Ok(())
}
