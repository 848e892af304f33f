//! Storage result types
//!
//! Defines result structures returned by storage operations. Paths exposed to
//! callers are virtual, i.e. relative to the user root.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::StorageError;
use crate::storage::tree::DirectoryTreeNode;

/// Result of a flat directory listing
#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    pub path: String,
    pub entries: Vec<String>,
}

/// Either listing shape, as selected by the `showStructure` flag
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Listing {
    Flat(ListResult),
    Tree(DirectoryTreeNode),
}

/// Result of a file upload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreResult {
    #[serde(skip)]
    pub file_path: PathBuf,
    #[serde(rename = "path")]
    pub virtual_path: String,
    pub bytes_written: u64,
}

/// Result of a directory creation
#[derive(Debug, Clone, Serialize)]
pub struct CreateDirectoryResult {
    #[serde(skip)]
    pub dir_path: PathBuf,
    #[serde(rename = "path")]
    pub virtual_path: String,
}

/// Result of a file or directory deletion
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    #[serde(skip)]
    pub file_path: PathBuf,
    #[serde(rename = "path")]
    pub virtual_path: String,
    pub was_directory: bool,
}

/// Result of a rename within one directory
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameResult {
    pub from: String,
    pub to: String,
    pub item_type: ItemType,
}

/// Result of a move between directories
#[derive(Debug, Clone, Serialize)]
pub struct MoveResult {
    pub from: String,
    pub to: String,
}

/// Item type named by a rename request. Only used in the response message;
/// it is not checked against the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    File,
    Directory,
}

impl FromStr for ItemType {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(ItemType::File),
            "directory" => Ok(ItemType::Directory),
            other => Err(StorageError::InvalidArgument(format!(
                "item type must be \"file\" or \"directory\", got {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::File => write!(f, "File"),
            ItemType::Directory => write!(f, "Directory"),
        }
    }
}
