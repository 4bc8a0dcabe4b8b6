use crate::blacklist::BlacklistSet;
use crate::config::types::AppConfig;
use crate::context::AppContext;
use crate::ssh::handler::SshHandler;
use crate::ssh::keys;

use anyhow::{Context, Result};
use russh::server::Server as _;
use russh::{MethodKind, MethodSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// How long open sessions may keep running after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Load the blacklist named by the configuration (empty when none is configured).
pub fn load_blacklist(config: &AppConfig) -> Result<BlacklistSet> {
    match &config.blacklist.dir {
        Some(dir) => {
            let set = BlacklistSet::load_dir(dir)?;
            info!(dir = %dir.display(), entries = set.len(), "Blacklist loaded");
            Ok(set)
        }
        None => Ok(BlacklistSet::empty()),
    }
}

/// Protocol-layer configuration: only publickey and keyboard-interactive are offered.
pub fn build_ssh_config(
    config: &AppConfig,
    host_key: russh::keys::PrivateKey,
) -> russh::server::Config {
    let server = &config.server;
    let mut ssh_config = russh::server::Config::default();
    ssh_config.keys.push(host_key);
    ssh_config.server_id = russh::SshId::Standard(server.server_id.clone());
    ssh_config.methods = MethodSet::from(
        [MethodKind::PublicKey, MethodKind::KeyboardInteractive].as_slice(),
    );
    ssh_config.max_auth_attempts = server.max_auth_attempts;
    ssh_config.auth_rejection_time = Duration::from_millis(server.auth_rejection_time_ms);
    ssh_config.auth_rejection_time_initial = Some(Duration::from_secs(0));
    // russh defaults to a 600s idle timeout; 0 must clear it
    ssh_config.inactivity_timeout = (server.inactivity_timeout_secs > 0)
        .then(|| Duration::from_secs(server.inactivity_timeout_secs));
    ssh_config
}

/// Main server entry point: bind, serve until SIGTERM / Ctrl-C, then drain.
pub async fn run(config: AppConfig) -> Result<()> {
    let blacklist = load_blacklist(&config)?;
    let host_key = keys::resolve_host_key(&config.server)?;
    let ssh_config = Arc::new(build_ssh_config(&config, host_key));

    let listener = TcpListener::bind(&config.server.listen)
        .await
        .with_context(|| format!("binding {}", config.server.listen))?;
    let local_addr = listener.local_addr().context("reading listener address")?;

    let ctx = Arc::new(AppContext::new(config, blacklist));
    let shutdown = CancellationToken::new();
    tokio::spawn(handle_signals(shutdown.clone()));

    info!(addr = %local_addr, "SSH server listening");
    serve(listener, ssh_config, ctx.clone(), shutdown).await?;

    let deadline = tokio::time::Instant::now() + DRAIN_TIMEOUT;
    while !ctx.registry.is_empty() {
        if tokio::time::Instant::now() >= deadline {
            warn!(
                active_sessions = ctx.registry.len(),
                "Shutdown timeout reached, forcing exit"
            );
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    info!("Shutdown complete");
    Ok(())
}

/// Accept connections on `listener` until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    ssh_config: Arc<russh::server::Config>,
    ctx: Arc<AppContext>,
    shutdown: CancellationToken,
) -> Result<()> {
    let mut server = SshServer { ctx };
    tokio::select! {
        result = server.run_on_socket(ssh_config, &listener) => {
            result.context("SSH accept loop failed")?;
        }
        _ = shutdown.cancelled() => {
            info!("No longer accepting connections");
        }
    }
    Ok(())
}

struct SshServer {
    ctx: Arc<AppContext>,
}

impl russh::server::Server for SshServer {
    type Handler = SshHandler;

    fn new_client(&mut self, peer_addr: Option<std::net::SocketAddr>) -> SshHandler {
        let handler = SshHandler::new(self.ctx.clone(), peer_addr);
        info!(peer = ?peer_addr, conn_id = %handler.conn_id(), "New SSH connection");
        handler
    }

    fn handle_session_error(&mut self, error: anyhow::Error) {
        warn!(error = %error, "SSH session error");
    }
}

#[cfg(unix)]
async fn handle_signals(shutdown: CancellationToken) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "Failed to install SIGTERM handler");
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("SIGTERM received, initiating graceful shutdown"),
        _ = tokio::signal::ctrl_c() => info!("Interrupt received, initiating graceful shutdown"),
    }
    shutdown.cancel();
}

#[cfg(not(unix))]
async fn handle_signals(shutdown: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Interrupt received, initiating graceful shutdown");
        shutdown.cancel();
    }
}
