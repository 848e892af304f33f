//! Path validation
//!
//! Lexical normalization, containment checks and name sanitation. Nothing in
//! here touches the filesystem.

use std::path::{Component, Path, PathBuf};

use crate::error::StorageError;

/// Resolves `.` and `..` segments and collapses separators without consulting
/// the filesystem. `..` never climbs above the filesystem root.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(segment) => normalized.push(segment),
        }
    }

    normalized
}

/// True if `candidate` is `root` or lies beneath it.
///
/// Both paths must already be normalized. The comparison is component-wise, so
/// `/base-evil` is not contained in `/base`.
pub fn is_contained(root: &Path, candidate: &Path) -> bool {
    candidate.starts_with(root)
}

/// Checks that `name` addresses exactly one entry: no separators, no `.`/`..`.
pub fn validate_bare_name<'a>(name: &'a str, what: &str) -> Result<&'a str, StorageError> {
    if name.trim().is_empty() {
        return Err(StorageError::InvalidArgument(format!(
            "{} must not be empty",
            what
        )));
    }

    if name.contains(['/', '\\', '\0']) || name == "." || name == ".." {
        return Err(StorageError::InvalidPath(format!(
            "{} must be a bare name: {}",
            what, name
        )));
    }

    Ok(name)
}

/// Renders `path` relative to `root` with `/` separators; the root itself is `""`.
pub fn virtual_path(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(relative) => relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path.to_string_lossy().into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_resolves_dot_segments() {
        assert_eq!(
            normalize_path(Path::new("/srv/users/alice/./docs/../notes//a.txt")),
            PathBuf::from("/srv/users/alice/notes/a.txt")
        );
    }

    #[test]
    fn normalize_clamps_at_filesystem_root() {
        assert_eq!(normalize_path(Path::new("/a/../../../etc")), PathBuf::from("/etc"));
    }

    #[test]
    fn containment_is_component_wise() {
        let root = Path::new("/srv/users/alice");
        assert!(is_contained(root, Path::new("/srv/users/alice")));
        assert!(is_contained(root, Path::new("/srv/users/alice/docs")));
        assert!(!is_contained(root, Path::new("/srv/users/alice-evil")));
        assert!(!is_contained(root, Path::new("/srv/users")));
    }

    #[test]
    fn bare_name_rejects_path_components() {
        assert!(validate_bare_name("report.pdf", "file name").is_ok());
        assert!(matches!(
            validate_bare_name("", "file name"),
            Err(StorageError::InvalidArgument(_))
        ));
        for bad in ["a/b", "..", ".", "a\\b", "/etc"] {
            assert!(
                matches!(validate_bare_name(bad, "file name"), Err(StorageError::InvalidPath(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn virtual_path_is_relative_to_root() {
        let root = Path::new("/srv/users/alice");
        assert_eq!(virtual_path(root, root), "");
        assert_eq!(virtual_path(root, &root.join("a").join("b.txt")), "a/b.txt");
    }
}
