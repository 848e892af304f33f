//! Per-user file storage
//!
//! Path containment for user roots and the filesystem operations built on it.

pub mod operations;
pub mod resolver;
pub mod results;
pub mod tree;
pub mod validation;

pub use operations::StorageOperations;
pub use resolver::{PathResolver, USERS_DIR};
pub use results::{
    CreateDirectoryResult, DeleteResult, ItemType, ListResult, Listing, MoveResult, RenameResult,
    StoreResult,
};
pub use tree::{DirectoryTreeNode, NodeKind};
