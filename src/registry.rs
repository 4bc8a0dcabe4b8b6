use std::fmt;

use dashmap::DashMap;
use uuid::Uuid;

use crate::blacklist::BlacklistSet;
use crate::keyinfo::CollectedKey;

/// Opaque per-connection identifier, minted when the protocol layer accepts a connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Compact 8-hex-character form used as the `conn_id` log field.
    pub fn short(&self) -> String {
        let bytes = self.0.as_bytes();
        format!(
            "{:02x}{:02x}{:02x}{:02x}",
            bytes[0], bytes[1], bytes[2], bytes[3]
        )
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Keys collected per connection, in the order the client offered them.
///
/// Backed by a `DashMap`: operations on the same session are serialized by the
/// shard lock, while different sessions rarely contend.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Vec<CollectedKey>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty entry for a freshly accepted connection.
    pub fn open(&self, id: &SessionId) {
        self.sessions.entry(id.clone()).or_default();
    }

    pub fn append(&self, id: &SessionId, key: CollectedKey) {
        self.sessions.entry(id.clone()).or_default().push(key);
    }

    /// Snapshot of the keys collected so far (empty if the session is unknown).
    pub fn get(&self, id: &SessionId) -> Vec<CollectedKey> {
        self.sessions
            .get(id)
            .map(|keys| keys.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn delete(&self, id: &SessionId) -> Option<Vec<CollectedKey>> {
        self.sessions.remove(id).map(|(_, keys)| keys)
    }

    /// Set the `blacklisted` flag on every key of a session and return a snapshot.
    pub fn mark_blacklisted(&self, id: &SessionId, blacklist: &BlacklistSet) -> Vec<CollectedKey> {
        match self.sessions.get_mut(id) {
            Some(mut keys) => {
                for key in keys.iter_mut() {
                    key.blacklisted = blacklist.is_blacklisted(key);
                }
                keys.clone()
            }
            None => Vec::new(),
        }
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
