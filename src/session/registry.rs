//! Session registry
//!
//! Tracks live sessions so the server can cap how many run at once.

use std::collections::HashMap;
use std::net::SocketAddr;

use crate::error::ProtocolError;

/// Registry of active sessions, keyed by peer address
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SocketAddr, Option<String>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `addr` unless `max_sessions` are already active.
    pub fn try_register(
        &mut self,
        addr: SocketAddr,
        max_sessions: usize,
    ) -> Result<(), ProtocolError> {
        if self.sessions.len() >= max_sessions {
            return Err(ProtocolError::TooManySessions(max_sessions));
        }
        self.sessions.insert(addr, None);
        Ok(())
    }

    /// Records the user a registered session acts for.
    pub fn set_user(&mut self, addr: &SocketAddr, user_id: &str) {
        if let Some(entry) = self.sessions.get_mut(addr) {
            *entry = Some(user_id.to_string());
        }
    }

    /// Drops the session for `addr`, returning the user it was bound to.
    pub fn remove(&mut self, addr: &SocketAddr) -> Option<String> {
        self.sessions.remove(addr).flatten()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }
}
