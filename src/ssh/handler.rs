use crate::auth::AuthDecision;
use crate::context::AppContext;
use crate::keyinfo::CollectedKey;
use crate::registry::SessionId;
use crate::ssh::presenter::spawn_presenter;
use crate::ssh::session::{ChannelRequests, RequestKind};
use std::net::SocketAddr;
use std::sync::Arc;

use dashmap::DashMap;
use russh::server::{Auth, Msg, Session};
use russh::{Channel, ChannelId, MethodKind, MethodSet};
use tracing::{debug, info, warn};

/// Methods offered after a rejected attempt: keep iterating keys, then fall back.
fn harvest_methods() -> MethodSet {
    MethodSet::from([MethodKind::PublicKey, MethodKind::KeyboardInteractive].as_slice())
}

fn reject() -> Auth {
    Auth::Reject {
        proceed_with_methods: None,
        partial_success: false,
    }
}

/// Per-connection SSH handler
pub struct SshHandler {
    ctx: Arc<AppContext>,
    peer_addr: Option<SocketAddr>,
    session_id: SessionId,
    conn_id: String,
    channels: DashMap<ChannelId, Arc<ChannelRequests>>,
}

impl SshHandler {
    pub fn new(ctx: Arc<AppContext>, peer_addr: Option<SocketAddr>) -> Self {
        let session_id = SessionId::new();
        let conn_id = session_id.short();
        ctx.registry.open(&session_id);
        Self {
            ctx,
            peer_addr,
            session_id,
            conn_id,
            channels: DashMap::new(),
        }
    }

    pub fn conn_id(&self) -> &str {
        &self.conn_id
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Record a channel request and send the matching reply.
    fn observe_request(&self, channel: ChannelId, kind: RequestKind, session: &mut Session) {
        let supported = match self.channels.get(&channel) {
            Some(requests) => requests.observe(kind),
            None => false,
        };
        debug!(conn_id = %self.conn_id, channel = ?channel, request = ?kind, supported, "Channel request");
        if supported {
            let _ = session.channel_success(channel);
        } else {
            let _ = session.channel_failure(channel);
        }
    }
}

impl Drop for SshHandler {
    fn drop(&mut self) {
        let keys = self
            .ctx
            .registry
            .delete(&self.session_id)
            .map(|keys| keys.len())
            .unwrap_or(0);
        debug!(conn_id = %self.conn_id, keys, "Connection closed, session removed");
    }
}

impl russh::server::Handler for SshHandler {
    type Error = anyhow::Error;

    async fn auth_none(&mut self, user: &str) -> Result<Auth, Self::Error> {
        debug!(conn_id = %self.conn_id, user = %user, "auth_none attempt (rejected)");
        Ok(Auth::Reject {
            proceed_with_methods: Some(harvest_methods()),
            partial_success: false,
        })
    }

    async fn auth_password(&mut self, user: &str, _password: &str) -> Result<Auth, Self::Error> {
        debug!(conn_id = %self.conn_id, user = %user, "Password auth attempt (rejected)");
        Ok(Auth::Reject {
            proceed_with_methods: Some(harvest_methods()),
            partial_success: false,
        })
    }

    /// Called for every offered key before any signature is checked.
    async fn auth_publickey_offered(
        &mut self,
        user: &str,
        public_key: &russh::keys::PublicKey,
    ) -> Result<Auth, Self::Error> {
        let key = CollectedKey::from_public_key(public_key);
        debug!(conn_id = %self.conn_id, user = %user, "Public key offered");
        match self.ctx.auth.offer_public_key(&self.session_id, key) {
            AuthDecision::Accept => Ok(Auth::Accept),
            AuthDecision::Reject => Ok(reject()),
        }
    }

    async fn auth_publickey(
        &mut self,
        user: &str,
        _public_key: &russh::keys::PublicKey,
    ) -> Result<Auth, Self::Error> {
        // Offers are refused up front, so a signed attempt is unexpected
        debug!(conn_id = %self.conn_id, user = %user, "Signed public key attempt (rejected)");
        Ok(reject())
    }

    async fn auth_keyboard_interactive<'a>(
        &'a mut self,
        user: &str,
        _submethods: &str,
        _response: Option<russh::server::Response<'a>>,
    ) -> Result<Auth, Self::Error> {
        debug!(conn_id = %self.conn_id, user = %user, "Keyboard-interactive attempt");
        match self.ctx.auth.attempt_interactive(&self.session_id) {
            AuthDecision::Accept => Ok(Auth::Accept),
            AuthDecision::Reject => Ok(reject()),
        }
    }

    async fn channel_open_session(
        &mut self,
        channel: Channel<Msg>,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        let requests = Arc::new(ChannelRequests::new());
        self.channels.insert(channel.id(), requests.clone());
        info!(
            conn_id = %self.conn_id,
            peer = ?self.peer_addr,
            channel = ?channel.id(),
            "Session channel opened"
        );
        spawn_presenter(self.ctx.clone(), self.session_id.clone(), channel, requests);
        Ok(true)
    }

    async fn channel_close(
        &mut self,
        channel: ChannelId,
        _session: &mut Session,
    ) -> Result<(), Self::Error> {
        self.channels.remove(&channel);
        Ok(())
    }

    async fn pty_request(
        &mut self,
        channel: ChannelId,
        _term: &str,
        _col_width: u32,
        _row_height: u32,
        _pix_width: u32,
        _pix_height: u32,
        _modes: &[(russh::Pty, u32)],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        self.observe_request(channel, RequestKind::PtyReq, session);
        Ok(())
    }

    async fn shell_request(
        &mut self,
        channel: ChannelId,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        self.observe_request(channel, RequestKind::Shell, session);
        Ok(())
    }

    async fn agent_request(
        &mut self,
        channel: ChannelId,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        // The protocol layer sends the reply from the returned flag
        let supported = match self.channels.get(&channel) {
            Some(requests) => requests.observe(RequestKind::AgentForwarding),
            None => false,
        };
        debug!(conn_id = %self.conn_id, channel = ?channel, supported, "Agent forwarding requested");
        Ok(supported)
    }

    async fn x11_request(
        &mut self,
        channel: ChannelId,
        _single_connection: bool,
        _x11_auth_protocol: &str,
        _x11_auth_cookie: &str,
        _x11_screen_number: u32,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        self.observe_request(channel, RequestKind::X11, session);
        Ok(())
    }

    async fn exec_request(
        &mut self,
        channel: ChannelId,
        _data: &[u8],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        self.observe_request(channel, RequestKind::Other, session);
        Ok(())
    }

    async fn subsystem_request(
        &mut self,
        channel: ChannelId,
        name: &str,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        debug!(conn_id = %self.conn_id, subsystem = %name, "Subsystem request");
        self.observe_request(channel, RequestKind::Other, session);
        Ok(())
    }

    async fn env_request(
        &mut self,
        channel: ChannelId,
        _variable_name: &str,
        _variable_value: &str,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        self.observe_request(channel, RequestKind::Other, session);
        Ok(())
    }

    async fn window_change_request(
        &mut self,
        channel: ChannelId,
        _col_width: u32,
        _row_height: u32,
        _pix_width: u32,
        _pix_height: u32,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        self.observe_request(channel, RequestKind::Other, session);
        Ok(())
    }

    async fn signal(
        &mut self,
        channel: ChannelId,
        _signal: russh::Sig,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        self.observe_request(channel, RequestKind::Other, session);
        Ok(())
    }

    async fn channel_open_direct_tcpip(
        &mut self,
        _channel: Channel<Msg>,
        host_to_connect: &str,
        port_to_connect: u32,
        _originator_address: &str,
        _originator_port: u32,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        warn!(
            conn_id = %self.conn_id,
            host = %host_to_connect,
            port = port_to_connect,
            "Direct-tcpip channel denied"
        );
        Ok(false)
    }

    async fn channel_open_forwarded_tcpip(
        &mut self,
        _channel: Channel<Msg>,
        host_to_connect: &str,
        port_to_connect: u32,
        _originator_address: &str,
        _originator_port: u32,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        warn!(
            conn_id = %self.conn_id,
            host = %host_to_connect,
            port = port_to_connect,
            "Forwarded-tcpip channel denied"
        );
        Ok(false)
    }

    async fn channel_open_x11(
        &mut self,
        _channel: Channel<Msg>,
        originator_address: &str,
        originator_port: u32,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        warn!(
            conn_id = %self.conn_id,
            originator = %format!("{}:{}", originator_address, originator_port),
            "X11 channel denied"
        );
        Ok(false)
    }
}
