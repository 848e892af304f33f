//! Error handling
//!
//! Defines error types and handling for the DropFile server.

pub mod handlers;
pub mod types;

pub use types::*;
