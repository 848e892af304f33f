//! Server core functionality
//!
//! Binds the session listener and runs the accept loop.

pub mod core;

pub use core::Server;
