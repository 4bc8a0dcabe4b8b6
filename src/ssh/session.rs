use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

/// Single-fire wake-up released by the first `shell` or `pty-req` on a channel.
///
/// Firing is idempotent and the waiter is bounded by a timeout, so neither the
/// request path nor the timer can release it twice.
#[derive(Debug, Default)]
pub struct ReadySignal {
    fired: AtomicBool,
    notify: Notify,
}

impl ReadySignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release the waiter. Returns `true` only for the first call.
    pub fn fire(&self) -> bool {
        if self.fired.swap(true, Ordering::AcqRel) {
            return false;
        }
        // notify_one stores a permit if nobody is waiting yet
        self.notify.notify_one();
        true
    }

    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Wait until fired or `timeout` elapses. Returns `true` if fired.
    pub async fn wait(&self, timeout: Duration) -> bool {
        if self.is_fired() {
            return true;
        }
        tokio::time::timeout(timeout, self.notify.notified())
            .await
            .is_ok()
    }
}

/// Channel request types the presenter distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Shell,
    PtyReq,
    AgentForwarding,
    X11,
    Other,
}

impl RequestKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "shell" => Self::Shell,
            "pty-req" => Self::PtyReq,
            "auth-agent-req@openssh.com" => Self::AgentForwarding,
            "x11-req" => Self::X11,
            _ => Self::Other,
        }
    }
}

/// Requests observed on one session channel.
#[derive(Debug, Default)]
pub struct ChannelRequests {
    agent_forwarding: AtomicBool,
    x11_forwarding: AtomicBool,
    ready: ReadySignal,
}

impl ChannelRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request. Returns whether it is supported (the reply to send).
    pub fn observe(&self, kind: RequestKind) -> bool {
        match kind {
            RequestKind::Shell | RequestKind::PtyReq => {
                self.ready.fire();
                true
            }
            RequestKind::AgentForwarding => {
                self.agent_forwarding.store(true, Ordering::Release);
                true
            }
            RequestKind::X11 => {
                self.x11_forwarding.store(true, Ordering::Release);
                true
            }
            RequestKind::Other => false,
        }
    }

    pub fn agent_forwarding(&self) -> bool {
        self.agent_forwarding.load(Ordering::Acquire)
    }

    pub fn x11_forwarding(&self) -> bool {
        self.x11_forwarding.load(Ordering::Acquire)
    }

    pub async fn wait_ready(&self, timeout: Duration) -> bool {
        self.ready.wait(timeout).await
    }
}
