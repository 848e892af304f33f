//! Error handlers
//!
//! Maps errors to response status codes and logs them at the right level.

use crate::error::types::{ProtocolError, ServerError, StorageError};
use log::{error, warn};

/// Log a server error
pub fn handle_error(err: &ServerError) {
    match err {
        ServerError::Storage(StorageError::StorageFailure(_))
        | ServerError::Config(_)
        | ServerError::IoError(_) => error!("DropFile server error: {}", err),
        _ => warn!("DropFile request rejected: {}", err),
    }
}

/// Convert a storage error to a response status code
pub fn storage_error_code(err: &StorageError) -> u16 {
    match err {
        StorageError::InvalidPath(_) => 400,
        StorageError::InvalidArgument(_) => 400,
        StorageError::NotFound(_) => 404,
        StorageError::Conflict(_) => 409,
        StorageError::StorageFailure(_) => 500,
    }
}

/// Convert any server error to a response status code
pub fn error_to_status_code(err: &ServerError) -> u16 {
    match err {
        ServerError::Storage(e) => storage_error_code(e),
        ServerError::Protocol(ProtocolError::MalformedRequest(_)) => 400,
        ServerError::Protocol(ProtocolError::NotIdentified) => 401,
        ServerError::Protocol(ProtocolError::AlreadyIdentified(_)) => 409,
        ServerError::Protocol(ProtocolError::UploadTooLarge { .. }) => 413,
        ServerError::Protocol(ProtocolError::RequestTooLong(_)) => 431,
        ServerError::Protocol(ProtocolError::TooManySessions(_)) => 503,
        ServerError::Config(_) => 500,
        ServerError::IoError(_) => 500,
    }
}

/// Name of the error kind reported in the response envelope
pub fn error_kind(err: &ServerError) -> &'static str {
    match err {
        ServerError::Storage(e) => e.kind(),
        ServerError::Protocol(_) => "ProtocolError",
        ServerError::Config(_) => "ConfigError",
        ServerError::IoError(_) => "IoError",
    }
}
