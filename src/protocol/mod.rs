//! Session protocol implementation
//!
//! Handles request parsing, dispatch to storage operations, and response
//! generation.

pub mod commands;
pub mod handlers;
pub mod parser;
pub mod responses;

pub use commands::{Command, CommandResult, CommandStatus};
pub use handlers::{handle_command, handle_upload};
pub use parser::parse_command;
pub use responses::Response;
