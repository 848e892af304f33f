//! Module `state`
//!
//! Per-connection session state: the peer address and, once the upstream
//! collaborator has declared it, the user the session acts for.

use std::net::SocketAddr;

/// State of one connected session.
#[derive(Debug, Default)]
pub struct Session {
    user_id: Option<String>,
    peer_addr: Option<SocketAddr>,
}

impl Session {
    pub fn new(peer_addr: SocketAddr) -> Self {
        Self {
            user_id: None,
            peer_addr: Some(peer_addr),
        }
    }

    /// Returns the user identity if set.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Returns the peer's socket address if known.
    pub fn peer_addr(&self) -> Option<&SocketAddr> {
        self.peer_addr.as_ref()
    }

    /// Binds the session to `user_id`.
    pub fn set_user_id(&mut self, user_id: Option<String>) {
        self.user_id = user_id;
    }

    /// Peer address for log lines.
    pub fn peer_label(&self) -> String {
        self.peer_addr
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}
