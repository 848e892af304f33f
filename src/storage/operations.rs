//! Storage operations
//!
//! Upload, listing, directory creation, delete, rename and move within a user
//! root. Every path is resolved and containment-checked before the filesystem
//! is touched, so a rejected call leaves nothing behind.

use log::{error, info};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

use crate::error::StorageError;
use crate::storage::resolver::{PathResolver, resolve_in, resolve_pair_in};
use crate::storage::results::{
    CreateDirectoryResult, DeleteResult, ItemType, ListResult, Listing, MoveResult, RenameResult,
    StoreResult,
};
use crate::storage::tree::{DirectoryTreeNode, build_tree};
use crate::storage::validation::{validate_bare_name, virtual_path};

/// Filesystem operations scoped to per-user roots under one storage root.
#[derive(Debug, Clone)]
pub struct StorageOperations {
    resolver: PathResolver,
}

impl StorageOperations {
    /// Creates the operations for `storage_root`; user roots live under `users/`.
    pub fn new(storage_root: impl AsRef<Path>) -> Result<Self, StorageError> {
        Ok(Self {
            resolver: PathResolver::new(storage_root.as_ref())?,
        })
    }

    /// Resolver used for every path these operations touch.
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Writes `content` to `<user root>/<original_filename>`.
    ///
    /// The name must be bare; uploads never land in a subdirectory. An existing
    /// file of the same name is overwritten.
    pub fn store<R: Read>(
        &self,
        user_id: &str,
        original_filename: &str,
        mut content: R,
    ) -> Result<StoreResult, StorageError> {
        let name = validate_bare_name(original_filename, "file name")?;
        let root = self.resolver.user_root(user_id)?;
        let file_path = resolve_in(&root, name)?;
        let virtual_file_path = virtual_path(&root, &file_path);

        match fs::symlink_metadata(&file_path) {
            Ok(meta) if meta.is_dir() => {
                return Err(StorageError::Conflict(virtual_file_path));
            }
            Ok(meta) if meta.file_type().is_symlink() => {
                return Err(StorageError::InvalidPath(virtual_file_path));
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(failure("inspect", &file_path, e)),
        }

        let mut file = File::create(&file_path).map_err(|e| failure("create", &file_path, e))?;
        let bytes_written =
            io::copy(&mut content, &mut file).map_err(|e| failure("write", &file_path, e))?;

        info!(
            "Stored {} for user {} ({} bytes, real: {})",
            virtual_file_path,
            user_id,
            bytes_written,
            file_path.display()
        );

        Ok(StoreResult {
            file_path,
            virtual_path: virtual_file_path,
            bytes_written,
        })
    }

    /// Names of the immediate children of `folder_path` (user root if `None`).
    pub fn list_flat(
        &self,
        user_id: &str,
        folder_path: Option<&str>,
    ) -> Result<ListResult, StorageError> {
        let root = self.resolver.user_root(user_id)?;
        let dir = resolve_in(&root, folder_path.unwrap_or(""))?;
        let virtual_dir = virtual_path(&root, &dir);
        require_directory(&dir, &virtual_dir)?;

        let read_dir = fs::read_dir(&dir).map_err(|e| failure("list", &dir, e))?;
        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| failure("list", &dir, e))?;
            entries.push(entry.file_name().to_string_lossy().into_owned());
        }
        entries.sort();

        info!(
            "Listed {:?} for user {} - {} entries",
            virtual_dir,
            user_id,
            entries.len()
        );

        Ok(ListResult {
            path: virtual_dir,
            entries,
        })
    }

    /// Recursive tree of `folder_path` (user root if `None`).
    pub fn list_tree(
        &self,
        user_id: &str,
        folder_path: Option<&str>,
    ) -> Result<DirectoryTreeNode, StorageError> {
        let root = self.resolver.user_root(user_id)?;
        let dir = resolve_in(&root, folder_path.unwrap_or(""))?;
        let virtual_dir = virtual_path(&root, &dir);
        require_directory(&dir, &virtual_dir)?;

        let tree = build_tree(&dir).map_err(|e| failure("walk", &dir, e))?;

        info!("Built tree of {:?} for user {}", virtual_dir, user_id);
        Ok(tree)
    }

    /// Flat listing, or the full tree when `show_structure` is set.
    pub fn list(
        &self,
        user_id: &str,
        folder_path: Option<&str>,
        show_structure: bool,
    ) -> Result<Listing, StorageError> {
        if show_structure {
            self.list_tree(user_id, folder_path).map(Listing::Tree)
        } else {
            self.list_flat(user_id, folder_path).map(Listing::Flat)
        }
    }

    /// Creates `<folder_path>/<directory_name>`. The parent must already exist.
    pub fn create_directory(
        &self,
        user_id: &str,
        folder_path: &str,
        directory_name: &str,
    ) -> Result<CreateDirectoryResult, StorageError> {
        let name = validate_bare_name(directory_name, "directory name")?;
        let root = self.resolver.user_root(user_id)?;
        let (parent, dir_path) =
            resolve_pair_in(&root, folder_path, Path::new(folder_path).join(name))?;
        require_directory(&parent, &virtual_path(&root, &parent))?;

        let virtual_dir = virtual_path(&root, &dir_path);
        match fs::create_dir(&dir_path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(StorageError::Conflict(virtual_dir));
            }
            Err(e) => return Err(failure("create directory", &dir_path, e)),
        }

        info!("Created directory {} for user {}", virtual_dir, user_id);

        Ok(CreateDirectoryResult {
            dir_path,
            virtual_path: virtual_dir,
        })
    }

    /// Deletes `<folder_path>/<item_name>`, recursively for directories.
    /// Symlinks are unlinked, never followed.
    pub fn delete(
        &self,
        user_id: &str,
        folder_path: &str,
        item_name: &str,
    ) -> Result<DeleteResult, StorageError> {
        let item_name = validate_bare_name(item_name, "item name")?;

        let root = self.resolver.user_root(user_id)?;
        let file_path = resolve_in(&root, Path::new(folder_path).join(item_name))?;
        if file_path == root {
            return Err(StorageError::InvalidPath("cannot delete the user root".into()));
        }
        let virtual_file_path = virtual_path(&root, &file_path);

        let meta = match fs::symlink_metadata(&file_path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(virtual_file_path));
            }
            Err(e) => return Err(failure("inspect", &file_path, e)),
        };

        let was_directory = meta.is_dir();
        let removed = if was_directory {
            fs::remove_dir_all(&file_path)
        } else {
            fs::remove_file(&file_path)
        };
        removed.map_err(|e| failure("delete", &file_path, e))?;

        info!(
            "Deleted {} {} for user {}",
            if was_directory { "directory" } else { "file" },
            virtual_file_path,
            user_id
        );

        Ok(DeleteResult {
            file_path,
            virtual_path: virtual_file_path,
            was_directory,
        })
    }

    /// Renames `old_name` to `new_name` inside `folder_path`.
    ///
    /// `item_type` must be `"file"` or `"directory"` but is not compared with
    /// what is on disk. An existing `new_name` is never replaced.
    pub fn rename(
        &self,
        user_id: &str,
        folder_path: &str,
        old_name: &str,
        new_name: &str,
        item_type: &str,
    ) -> Result<RenameResult, StorageError> {
        let item_type: ItemType = item_type.parse()?;
        let old_name = validate_bare_name(old_name, "old name")?;
        let new_name = validate_bare_name(new_name, "new name")?;

        let root = self.resolver.user_root(user_id)?;
        let parent = Path::new(folder_path);
        let (from, to) = resolve_pair_in(&root, parent.join(old_name), parent.join(new_name))?;
        let (virtual_from, virtual_to) = (virtual_path(&root, &from), virtual_path(&root, &to));

        if !exists(&from)? {
            return Err(StorageError::NotFound(virtual_from));
        }
        if exists(&to)? {
            return Err(StorageError::Conflict(virtual_to));
        }

        fs::rename(&from, &to).map_err(|e| failure("rename", &from, e))?;

        info!(
            "{} renamed {} -> {} for user {}",
            item_type, virtual_from, virtual_to, user_id
        );

        Ok(RenameResult {
            from: virtual_from,
            to: virtual_to,
            item_type,
        })
    }

    /// Moves `current_path` to `destination_path`.
    ///
    /// The destination's parent must exist. If the destination itself exists the
    /// outcome is whatever the host `rename` does (on POSIX a file replaces a
    /// file and a directory replaces an empty directory).
    pub fn move_item(
        &self,
        user_id: &str,
        current_path: &str,
        destination_path: &str,
    ) -> Result<MoveResult, StorageError> {
        if current_path.trim().is_empty() || destination_path.trim().is_empty() {
            return Err(StorageError::InvalidArgument(
                "current and destination paths are required".into(),
            ));
        }

        let root = self.resolver.user_root(user_id)?;
        let (from, to) = resolve_pair_in(&root, current_path, destination_path)?;
        if from == root || to == root {
            return Err(StorageError::InvalidPath("cannot move the user root".into()));
        }
        let (virtual_from, virtual_to) = (virtual_path(&root, &from), virtual_path(&root, &to));

        if !exists(&from)? {
            return Err(StorageError::NotFound(virtual_from));
        }
        if to != from && to.starts_with(&from) {
            return Err(StorageError::InvalidArgument(format!(
                "cannot move {} into itself",
                virtual_from
            )));
        }
        let dest_parent = to.parent().unwrap_or(root.as_path());
        require_directory(dest_parent, &virtual_path(&root, dest_parent))?;

        fs::rename(&from, &to).map_err(|e| failure("move", &from, e))?;

        info!("Moved {} -> {} for user {}", virtual_from, virtual_to, user_id);

        Ok(MoveResult {
            from: virtual_from,
            to: virtual_to,
        })
    }
}

/// `NotFound` unless `dir` is a real directory (a symlink to one does not count).
fn require_directory(dir: &Path, virtual_dir: &str) -> Result<(), StorageError> {
    match fs::symlink_metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(StorageError::NotFound(format!(
            "{} is not a directory",
            display_virtual(virtual_dir)
        ))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(StorageError::NotFound(display_virtual(virtual_dir).to_string()))
        }
        Err(e) => Err(failure("inspect", dir, e)),
    }
}

/// Existence without following a trailing symlink.
fn exists(path: &Path) -> Result<bool, StorageError> {
    match fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(failure("inspect", path, e)),
    }
}

fn display_virtual(virtual_dir: &str) -> &str {
    if virtual_dir.is_empty() { "/" } else { virtual_dir }
}

fn failure(action: &str, path: &Path, e: io::Error) -> StorageError {
    error!("Failed to {} {}: {}", action, path.display(), e);
    StorageError::StorageFailure(e)
}
