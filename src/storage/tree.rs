//! Directory tree listing
//!
//! Builds the recursive structure returned by the "show structure" listing.

use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;

/// Kind of a tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

/// One entry of a directory tree. `children` is set only for directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryTreeNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<DirectoryTreeNode>>,
}

impl DirectoryTreeNode {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::File,
            children: None,
        }
    }

    pub fn directory(name: impl Into<String>, children: Vec<DirectoryTreeNode>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Directory,
            children: Some(children),
        }
    }

    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// Looks up a direct child by name.
    pub fn child(&self, name: &str) -> Option<&DirectoryTreeNode> {
        self.children
            .as_ref()
            .and_then(|children| children.iter().find(|c| c.name == name))
    }
}

/// Walks `directory` recursively. Symlinks become `file` leaves and are never
/// followed, so the walk cannot leave the subtree or loop.
pub fn build_tree(directory: &Path) -> io::Result<DirectoryTreeNode> {
    let name = directory
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(DirectoryTreeNode::directory(name, read_children(directory)?))
}

fn read_children(directory: &Path) -> io::Result<Vec<DirectoryTreeNode>> {
    let mut children = Vec::new();

    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();

        // DirEntry::file_type does not traverse symlinks
        if entry.file_type()?.is_dir() {
            children.push(DirectoryTreeNode::directory(
                name,
                read_children(&entry.path())?,
            ));
        } else {
            children.push(DirectoryTreeNode::file(name));
        }
    }

    children.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn builds_nested_tree() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("b.txt"), b"b").unwrap();

        let tree = build_tree(dir.path()).unwrap();

        assert!(tree.is_directory());
        assert_eq!(
            tree.children.as_deref().unwrap(),
            &[
                DirectoryTreeNode::file("a.txt"),
                DirectoryTreeNode::directory("sub", vec![DirectoryTreeNode::file("b.txt")]),
            ]
        );
    }

    #[test]
    fn serializes_children_only_for_directories() {
        let node = DirectoryTreeNode::directory("root", vec![DirectoryTreeNode::file("a.txt")]);
        let json = serde_json::to_value(&node).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "name": "root",
                "type": "directory",
                "children": [{ "name": "a.txt", "type": "file" }]
            })
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_leaves() {
        let dir = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        fs::write(target.path().join("secret.txt"), b"s").unwrap();
        std::os::unix::fs::symlink(target.path(), dir.path().join("link")).unwrap();
        // a loop back onto itself must not recurse
        std::os::unix::fs::symlink(dir.path(), dir.path().join("self")).unwrap();

        let tree = build_tree(dir.path()).unwrap();

        assert_eq!(tree.child("link"), Some(&DirectoryTreeNode::file("link")));
        assert_eq!(tree.child("self"), Some(&DirectoryTreeNode::file("self")));
    }
}
