//! Request line parsing

use crate::error::ProtocolError;
use crate::protocol::Command;

/// Decodes one request line into a [`Command`].
pub fn parse_command(raw: &str) -> Result<Command, ProtocolError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ProtocolError::MalformedRequest("empty request".into()));
    }

    serde_json::from_str(trimmed).map_err(|e| ProtocolError::MalformedRequest(e.to_string()))
}
