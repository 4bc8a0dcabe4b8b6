use std::sync::Arc;
use std::time::Duration;

use russh::server::Msg;
use russh::Channel;
use tracing::{debug, error, info_span, warn, Instrument};

use crate::context::AppContext;
use crate::keyinfo::CollectedKey;
use crate::registry::SessionId;
use crate::report::{Report, ReportRow};
use crate::ssh::session::ChannelRequests;

/// Build the report for a session's keys. Bit-length failures are logged and
/// rendered as an unknown size; they never drop the row.
pub fn build_report(
    keys: &[CollectedKey],
    requests: &ChannelRequests,
    warn_client: bool,
) -> Report {
    let rows = keys
        .iter()
        .map(|key| {
            let bits = match key.bit_length() {
                Ok(bits) => Some(bits),
                Err(e) => {
                    error!(
                        algorithm = %key.algorithm(),
                        fingerprint = %key.fingerprint(),
                        error = %e,
                        "Failed to compute key length"
                    );
                    None
                }
            };
            ReportRow {
                bits,
                algorithm: key.algorithm().to_string(),
                fingerprint: key.fingerprint(),
            }
        })
        .collect();

    let blacklisted = if warn_client {
        keys.iter()
            .filter(|key| key.blacklisted)
            .map(CollectedKey::fingerprint)
            .collect()
    } else {
        Vec::new()
    };

    Report {
        rows,
        agent_forwarding: requests.agent_forwarding(),
        x11_forwarding: requests.x11_forwarding(),
        blacklisted,
    }
}

/// Spawn the presenter for a freshly opened session channel.
pub fn spawn_presenter(
    ctx: Arc<AppContext>,
    session_id: SessionId,
    channel: Channel<Msg>,
    requests: Arc<ChannelRequests>,
) {
    let span = info_span!("present", conn_id = %session_id.short(), channel = ?channel.id());
    tokio::spawn(present(ctx, session_id, channel, requests).instrument(span));
}

async fn present(
    ctx: Arc<AppContext>,
    session_id: SessionId,
    channel: Channel<Msg>,
    requests: Arc<ChannelRequests>,
) {
    let timeout = Duration::from_secs(ctx.config.server.request_timeout_secs);
    if !requests.wait_ready(timeout).await {
        debug!(
            timeout_secs = timeout.as_secs(),
            "No shell or pty request before timeout, presenting anyway"
        );
    }

    let keys = ctx.registry.mark_blacklisted(&session_id, &ctx.blacklist);
    for key in keys.iter().filter(|key| key.blacklisted) {
        warn!(
            algorithm = %key.algorithm(),
            fingerprint = %key.fingerprint(),
            "Blacklisted key presented"
        );
    }

    let report = build_report(&keys, &requests, ctx.config.blacklist.warn_client);
    let text = report.render();

    if let Err(e) = channel.data(text.as_bytes()).await {
        warn!(error = %e, "Failed to write key report");
    } else {
        debug!(keys = keys.len(), "Key report written");
    }
    if let Err(e) = channel.close().await {
        warn!(error = %e, "Failed to close channel");
    }
}
