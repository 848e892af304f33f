//! Response envelopes
//!
//! Every request gets exactly one JSON line back.

use log::error;
use serde::Serialize;

use crate::error::ServerError;
use crate::error::handlers::{error_kind, error_to_status_code};

/// Standard response codes
pub const OK: u16 = 200;
pub const CREATED: u16 = 201;
pub const READY: u16 = 220;
pub const GOODBYE: u16 = 221;

#[derive(Debug, Serialize)]
pub struct Response {
    pub status: &'static str,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Response {
    pub fn ok(code: u16, message: impl Into<String>) -> Self {
        Self {
            status: "ok",
            code,
            kind: None,
            message: message.into(),
            data: None,
        }
    }

    pub fn from_error(err: &ServerError) -> Self {
        Self {
            status: "error",
            code: error_to_status_code(err),
            kind: Some(error_kind(err)),
            message: err.to_string(),
            data: None,
        }
    }

    /// Attaches a serialized payload.
    pub fn with_data<T: Serialize>(mut self, data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => self.data = Some(value),
            Err(e) => error!("Failed to serialize response payload: {}", e),
        }
        self
    }

    /// Serialized form, newline terminated.
    pub fn to_line(&self) -> String {
        match serde_json::to_string(self) {
            Ok(mut line) => {
                line.push('\n');
                line
            }
            Err(e) => {
                error!("Failed to serialize response: {}", e);
                "{\"status\":\"error\",\"code\":500,\"message\":\"internal error\"}\n".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;

    #[test]
    fn error_envelope_carries_kind_and_code() {
        let err = ServerError::from(StorageError::Conflict("docs".into()));
        let value: serde_json::Value =
            serde_json::from_str(&Response::from_error(&err).to_line()).unwrap();

        assert_eq!(value["status"], "error");
        assert_eq!(value["code"], 409);
        assert_eq!(value["kind"], "Conflict");
        assert!(value.get("data").is_none());
    }

    #[test]
    fn ok_envelope_omits_kind() {
        let line = Response::ok(OK, "done").with_data(&vec!["a.txt"]).to_line();
        assert!(line.ends_with('\n'));

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["data"], serde_json::json!(["a.txt"]));
        assert!(value.get("kind").is_none());
    }
}
