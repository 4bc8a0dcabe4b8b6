//! Authentication strategy invoked by the SSH handler.
//!
//! The server never authenticates anyone. Public-key offers are recorded and
//! refused so the client moves on to its next key; once the client runs out of
//! keys it falls back to keyboard-interactive, which is accepted without a
//! challenge so the connection can proceed to a session channel.

use std::sync::Arc;

use tracing::{debug, info};

use crate::keyinfo::CollectedKey;
use crate::registry::{SessionId, SessionRegistry};

/// Outcome of one authentication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    Accept,
    Reject,
}

/// Decides public-key and keyboard-interactive attempts for a connection.
pub trait AuthStrategy: Send + Sync {
    fn offer_public_key(&self, session: &SessionId, key: CollectedKey) -> AuthDecision;

    fn attempt_interactive(&self, session: &SessionId) -> AuthDecision;
}

/// Records every offered key in the session registry.
pub struct KeyHarvester {
    registry: Arc<SessionRegistry>,
}

impl KeyHarvester {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }
}

impl AuthStrategy for KeyHarvester {
    fn offer_public_key(&self, session: &SessionId, key: CollectedKey) -> AuthDecision {
        debug!(
            conn_id = %session.short(),
            algorithm = %key.algorithm(),
            fingerprint = %key.fingerprint(),
            "Public key collected, rejected"
        );
        self.registry.append(session, key);
        // Accepting would stop the client from offering the rest of its keys
        AuthDecision::Reject
    }

    fn attempt_interactive(&self, session: &SessionId) -> AuthDecision {
        info!(
            conn_id = %session.short(),
            keys = self.registry.get(session).len(),
            "Keyboard-interactive auth success"
        );
        AuthDecision::Accept
    }
}
