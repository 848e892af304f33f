//! Per-user path resolution
//!
//! Maps a user identifier and an untrusted relative path to an absolute path
//! under `<storage_root>/users/<user_id>`, rejecting anything that would land
//! outside that directory.

use log::{debug, error, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::storage::validation::{is_contained, normalize_path, validate_bare_name};

/// Directory under the storage root holding one subdirectory per user.
pub const USERS_DIR: &str = "users";

/// Resolves user-supplied paths against per-user roots.
#[derive(Debug, Clone)]
pub struct PathResolver {
    users_root: PathBuf,
}

impl PathResolver {
    /// Creates a resolver for `storage_root`, which is made absolute once here.
    pub fn new(storage_root: &Path) -> Result<Self, StorageError> {
        let absolute = std::path::absolute(storage_root)?;
        Ok(Self {
            users_root: normalize_path(&absolute.join(USERS_DIR)),
        })
    }

    /// Directory holding every user root.
    pub fn users_root(&self) -> &Path {
        &self.users_root
    }

    /// Returns the root directory of `user_id`, creating it if absent.
    pub fn user_root(&self, user_id: &str) -> Result<PathBuf, StorageError> {
        validate_bare_name(user_id, "user id")?;

        let root = normalize_path(&self.users_root.join(user_id));
        if root == self.users_root || !is_contained(&self.users_root, &root) {
            warn!("Rejected user id {:?}", user_id);
            return Err(StorageError::InvalidPath(format!("user id {}", user_id)));
        }

        fs::create_dir_all(&root).map_err(|e| {
            error!("Failed to create user root {}: {}", root.display(), e);
            StorageError::from(e)
        })?;

        Ok(root)
    }

    /// Resolves `relative` under the root of `user_id`.
    pub fn resolve(&self, user_id: &str, relative: &str) -> Result<PathBuf, StorageError> {
        let root = self.user_root(user_id)?;
        resolve_in(&root, relative)
    }

    /// Resolves two paths under the same user root. Both must pass before
    /// either is returned.
    pub fn resolve_pair(
        &self,
        user_id: &str,
        first: &str,
        second: &str,
    ) -> Result<(PathBuf, PathBuf), StorageError> {
        let root = self.user_root(user_id)?;
        resolve_pair_in(&root, first, second)
    }
}

/// Resolves `relative` against an already established user root.
///
/// An empty `relative` addresses the root itself. Absolute inputs replace the
/// base when joined and are therefore rejected by the containment check.
pub fn resolve_in(root: &Path, relative: impl AsRef<Path>) -> Result<PathBuf, StorageError> {
    let relative = relative.as_ref();
    let shown = relative.to_string_lossy();

    if relative.as_os_str().as_encoded_bytes().contains(&0) {
        return Err(StorageError::InvalidPath(shown.escape_debug().to_string()));
    }

    let candidate = normalize_path(&root.join(relative));

    if !is_contained(root, &candidate) {
        warn!(
            "Path {:?} escapes user root {} (resolved to {})",
            shown,
            root.display(),
            candidate.display()
        );
        return Err(StorageError::InvalidPath(shown.into_owned()));
    }

    reject_symlinked_ancestors(root, &candidate, &shown)?;

    debug!("Resolved {:?} to {}", shown, candidate.display());
    Ok(candidate)
}

/// Pair variant of [`resolve_in`]; fails if either path fails.
pub fn resolve_pair_in(
    root: &Path,
    first: impl AsRef<Path>,
    second: impl AsRef<Path>,
) -> Result<(PathBuf, PathBuf), StorageError> {
    let first = resolve_in(root, first)?;
    let second = resolve_in(root, second)?;
    Ok((first, second))
}

/// Fails if any existing directory between `root` and the last component of
/// `candidate` is a symlink. The last component itself is left alone.
fn reject_symlinked_ancestors(
    root: &Path,
    candidate: &Path,
    relative: &str,
) -> Result<(), StorageError> {
    let Ok(below_root) = candidate.strip_prefix(root) else {
        return Err(StorageError::InvalidPath(relative.to_string()));
    };

    let mut current = root.to_path_buf();
    let mut components = below_root.components().peekable();

    while let Some(component) = components.next() {
        if components.peek().is_none() {
            break;
        }
        current.push(component);

        match fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => {
                warn!(
                    "Path {:?} traverses symlink {}",
                    relative,
                    current.display()
                );
                return Err(StorageError::InvalidPath(relative.to_string()));
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => break,
            Err(e) => return Err(StorageError::from(e)),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathResolver) {
        let dir = TempDir::new().unwrap();
        let resolver = PathResolver::new(dir.path()).unwrap();
        (dir, resolver)
    }

    #[test]
    fn test_empty_path_is_user_root() {
        let (_dir, resolver) = setup();
        let root = resolver.user_root("alice").unwrap();
        assert_eq!(resolver.resolve("alice", "").unwrap(), root);
        assert!(root.is_dir());
        assert!(root.ends_with("users/alice"));
    }

    #[test]
    fn test_user_root_creation_is_idempotent() {
        let (_dir, resolver) = setup();
        let first = resolver.user_root("alice").unwrap();
        let second = resolver.user_root("alice").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolves_nested_path() {
        let (_dir, resolver) = setup();
        let root = resolver.user_root("alice").unwrap();
        assert_eq!(
            resolver.resolve("alice", "docs/./2024/../report.txt").unwrap(),
            root.join("docs").join("report.txt")
        );
    }

    #[test]
    fn test_inner_parent_segments_stay_contained() {
        let (_dir, resolver) = setup();
        let root = resolver.user_root("alice").unwrap();
        assert_eq!(resolver.resolve("alice", "a/..").unwrap(), root);
    }

    #[test]
    fn test_rejects_parent_escape() {
        let (_dir, resolver) = setup();
        for escape in ["..", "../bob", "../../etc/passwd", "a/../../b", "/etc/passwd"] {
            assert!(
                matches!(
                    resolver.resolve("alice", escape),
                    Err(StorageError::InvalidPath(_))
                ),
                "{escape} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_sibling_prefix_bypass() {
        let (_dir, resolver) = setup();
        resolver.user_root("alice-evil").unwrap();
        assert!(matches!(
            resolver.resolve("alice", "../alice-evil/x"),
            Err(StorageError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_rejects_bad_user_ids() {
        let (_dir, resolver) = setup();
        assert!(matches!(
            resolver.user_root(""),
            Err(StorageError::InvalidArgument(_))
        ));
        for bad in ["..", ".", "a/b", "../../tmp"] {
            assert!(
                matches!(resolver.user_root(bad), Err(StorageError::InvalidPath(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_pair_fails_when_either_path_escapes() {
        let (_dir, resolver) = setup();
        assert!(resolver.resolve_pair("alice", "a.txt", "b.txt").is_ok());
        assert!(matches!(
            resolver.resolve_pair("alice", "a.txt", "../b.txt"),
            Err(StorageError::InvalidPath(_))
        ));
        assert!(matches!(
            resolver.resolve_pair("alice", "../a.txt", "b.txt"),
            Err(StorageError::InvalidPath(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_rejects_paths_through_symlinks() {
        let (dir, resolver) = setup();
        let root = resolver.user_root("alice").unwrap();
        let outside = dir.path().join("outside");
        fs::create_dir(&outside).unwrap();
        std::os::unix::fs::symlink(&outside, root.join("link")).unwrap();

        assert!(matches!(
            resolver.resolve("alice", "link/secret.txt"),
            Err(StorageError::InvalidPath(_))
        ));
        // the link itself may still be addressed
        assert_eq!(resolver.resolve("alice", "link").unwrap(), root.join("link"));
    }
}
