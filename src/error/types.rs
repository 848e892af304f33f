//! Error types
//!
//! Defines the error taxonomy shared by the storage core and the session front-end.

use std::fmt;
use std::io;

/// Storage module errors
///
/// Every filesystem outcome of a storage operation collapses into one of these
/// kinds. Raw `io::Error`s never escape a storage call except wrapped in
/// `StorageFailure`.
#[derive(Debug)]
pub enum StorageError {
    /// Containment check failed, or a name carried a path component.
    InvalidPath(String),
    /// Missing required parameter, empty name or unrecognized enum value.
    InvalidArgument(String),
    NotFound(String),
    /// Target of a create or rename already exists.
    Conflict(String),
    StorageFailure(io::Error),
}

impl StorageError {
    /// Stable name of the error kind, used in response envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            StorageError::InvalidPath(_) => "InvalidPath",
            StorageError::InvalidArgument(_) => "InvalidArgument",
            StorageError::NotFound(_) => "NotFound",
            StorageError::Conflict(_) => "Conflict",
            StorageError::StorageFailure(_) => "StorageFailure",
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::InvalidPath(p) => write!(f, "Invalid path: {}", p),
            StorageError::InvalidArgument(s) => write!(f, "Invalid argument: {}", s),
            StorageError::NotFound(p) => write!(f, "Not found: {}", p),
            StorageError::Conflict(p) => write!(f, "Already exists: {}", p),
            StorageError::StorageFailure(e) => write!(f, "Storage failure: {}", e),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::StorageFailure(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(error: io::Error) -> Self {
        StorageError::StorageFailure(error)
    }
}

/// Session protocol errors
#[derive(Debug)]
pub enum ProtocolError {
    MalformedRequest(String),
    NotIdentified,
    AlreadyIdentified(String),
    RequestTooLong(usize),
    UploadTooLarge { size: u64, limit: u64 },
    TooManySessions(usize),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::MalformedRequest(msg) => write!(f, "Malformed request: {}", msg),
            ProtocolError::NotIdentified => write!(f, "Session has no user identity"),
            ProtocolError::AlreadyIdentified(user) => {
                write!(f, "Session already identified as {}", user)
            }
            ProtocolError::RequestTooLong(limit) => {
                write!(f, "Request line exceeds {} bytes", limit)
            }
            ProtocolError::UploadTooLarge { size, limit } => {
                write!(f, "Upload of {} bytes exceeds limit of {} bytes", size, limit)
            }
            ProtocolError::TooManySessions(max) => {
                write!(f, "Too many sessions (max {})", max)
            }
        }
    }
}

impl std::error::Error for ProtocolError {}

/// General server error that encompasses all error types
#[derive(Debug)]
pub enum ServerError {
    Storage(StorageError),
    Protocol(ProtocolError),
    Config(config::ConfigError),
    IoError(io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Storage(e) => write!(f, "Storage error: {}", e),
            ServerError::Protocol(e) => write!(f, "Protocol error: {}", e),
            ServerError::Config(e) => write!(f, "Configuration error: {}", e),
            ServerError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<StorageError> for ServerError {
    fn from(error: StorageError) -> Self {
        ServerError::Storage(error)
    }
}

impl From<ProtocolError> for ServerError {
    fn from(error: ProtocolError) -> Self {
        ServerError::Protocol(error)
    }
}

impl From<config::ConfigError> for ServerError {
    fn from(error: config::ConfigError) -> Self {
        ServerError::Config(error)
    }
}

impl From<io::Error> for ServerError {
    fn from(error: io::Error) -> Self {
        ServerError::IoError(error)
    }
}
