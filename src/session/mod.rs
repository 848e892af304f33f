//! Session management
//!
//! Handles connected sessions, their identity, and the registry of live
//! sessions.

pub mod handler;
pub mod registry;
pub mod state;

pub use handler::{handle_session, serve_requests};
pub use registry::SessionRegistry;
pub use state::Session;
