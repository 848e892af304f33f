//! Module `commands`
//!
//! Defines the session commands, their outcome status and the result
//! structure returned by the handlers.

use serde::Deserialize;

use crate::error::ServerError;
use crate::error::handlers::handle_error;
use crate::protocol::responses::Response;

/// A request decoded from one JSON line, tagged by its `op` field.
///
/// Every parameter is untrusted. Missing strings decode as empty and are
/// reported by the storage core as invalid arguments.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Command {
    /// Declares the already authenticated user; must come first.
    #[serde(rename_all = "camelCase")]
    Identify {
        #[serde(default)]
        user_id: String,
    },
    #[serde(rename_all = "camelCase")]
    List {
        #[serde(default)]
        folder_path: Option<String>,
        #[serde(default)]
        show_structure: bool,
    },
    #[serde(rename_all = "camelCase")]
    CreateDirectory {
        #[serde(default)]
        folder_path: String,
        #[serde(default)]
        directory_name: String,
    },
    #[serde(rename_all = "camelCase")]
    Delete {
        #[serde(default)]
        folder_path: String,
        #[serde(default)]
        item_name: String,
    },
    #[serde(rename_all = "camelCase")]
    Rename {
        #[serde(default)]
        folder_path: String,
        #[serde(default)]
        old_name: String,
        #[serde(default)]
        new_name: String,
        #[serde(default)]
        item_type: String,
    },
    #[serde(rename_all = "camelCase")]
    Move {
        #[serde(default)]
        current_path: String,
        #[serde(default)]
        destination_path: String,
    },
    /// Followed on the wire by exactly `size` raw bytes.
    #[serde(rename_all = "camelCase")]
    Upload {
        #[serde(default)]
        original_filename: String,
        size: u64,
    },
    Quit,
}

/// Represents the outcome status of executing a command.
#[derive(Debug, PartialEq)]
pub enum CommandStatus {
    Success,
    Failure(String),
    CloseConnection,
}

/// Struct encapsulating the full result of a command execution.
#[derive(Debug)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub response: Response,
}

impl CommandResult {
    pub fn success(response: Response) -> Self {
        Self {
            status: CommandStatus::Success,
            response,
        }
    }

    /// Logs `err` and wraps its error envelope.
    pub fn failure(err: ServerError) -> Self {
        handle_error(&err);
        Self {
            status: CommandStatus::Failure(err.to_string()),
            response: Response::from_error(&err),
        }
    }

    pub fn close(response: Response) -> Self {
        Self {
            status: CommandStatus::CloseConnection,
            response,
        }
    }
}
