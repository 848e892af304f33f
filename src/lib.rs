//! DropFile storage server
//!
//! Per-user file storage with strict path containment: every user gets an
//! isolated directory under `<storage_root>/users/<user id>`, and no request
//! can reach outside it.

pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
pub mod session;
pub mod storage;

pub use crate::config::ServerConfig;
pub use error::{ServerError, StorageError};
pub use server::Server;
pub use storage::{DirectoryTreeNode, PathResolver, StorageOperations};
