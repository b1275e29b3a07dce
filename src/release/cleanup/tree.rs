//! Ordered snapshot of the staged tree, and pruning against exclusion rules.

use super::exclusion::{ExclusionRules, relative_key};
use crate::release::{
    error::{Error, ErrorExt, Result},
    utils::fs::{ensure_within, remove_guarded},
};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// Node of a directory snapshot.
///
/// Children are keyed by absolute path, so iteration is lexicographic by path.
/// Symlinks are recorded as file leaves and never followed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    /// A file or symlink.
    File(PathBuf),
    /// A directory and its children.
    Dir {
        /// Absolute directory path.
        path: PathBuf,
        /// Children keyed by their absolute path.
        children: BTreeMap<PathBuf, TreeNode>,
    },
}

impl TreeNode {
    /// Absolute path of this node.
    pub fn path(&self) -> &Path {
        match self {
            TreeNode::File(path) | TreeNode::Dir { path, .. } => path,
        }
    }

    /// Whether this node is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, TreeNode::Dir { .. })
    }

    /// Children in path order; empty for files.
    pub fn children(&self) -> impl Iterator<Item = &TreeNode> {
        let map = match self {
            TreeNode::Dir { children, .. } => Some(children),
            TreeNode::File(_) => None,
        };
        map.into_iter().flat_map(|c| c.values())
    }

    /// Paths of every file leaf, depth-first in path order.
    pub fn files(&self) -> Vec<&Path> {
        let mut out = Vec::new();
        self.collect_files(&mut out);
        out
    }

    fn collect_files<'a>(&'a self, out: &mut Vec<&'a Path>) {
        match self {
            TreeNode::File(path) => out.push(path),
            TreeNode::Dir { children, .. } => {
                for child in children.values() {
                    child.collect_files(out);
                }
            }
        }
    }
}

/// Recursively snapshot `root`.
///
/// # Errors
///
/// Fails if `root` (or any directory below it) cannot be listed.
pub fn snapshot(root: &Path) -> Result<TreeNode> {
    let mut children = BTreeMap::new();

    let entries = std::fs::read_dir(root).fs_context("listing directory", root)?;
    for entry in entries {
        let entry = entry.fs_context("reading directory entry", root)?;
        let path = entry.path();
        let file_type = entry.file_type().fs_context("reading file type", &path)?;

        let node = if file_type.is_dir() {
            snapshot(&path)?
        } else {
            TreeNode::File(path.clone())
        };
        children.insert(path, node);
    }

    Ok(TreeNode::Dir {
        path: root.to_path_buf(),
        children,
    })
}

/// Drops every excluded entry from `tree` and from disk.
///
/// Directories that match a rule are removed whole; their children are never
/// tested. Every visited path must lie under `guard_root`. Returns the
/// removed paths in visiting order.
pub fn prune(
    tree: &mut TreeNode,
    staging_root: &Path,
    rules: &ExclusionRules,
    guard_root: &Path,
) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    prune_into(tree, staging_root, rules, guard_root, &mut removed)?;
    Ok(removed)
}

fn prune_into(
    tree: &mut TreeNode,
    staging_root: &Path,
    rules: &ExclusionRules,
    guard_root: &Path,
    removed: &mut Vec<PathBuf>,
) -> Result<()> {
    let TreeNode::Dir { children, .. } = tree else {
        return Ok(());
    };

    let mut excluded = Vec::new();
    for (path, node) in children.iter() {
        ensure_within(path, guard_root)?;
        let relative = path.strip_prefix(staging_root).map_err(|_| Error::SafetyViolation {
            path: path.clone(),
            allowed_root: staging_root.to_path_buf(),
        })?;
        let key = relative_key(relative);
        if let Some(rule) = rules.matching_rule(&key, node.is_dir()) {
            log::debug!("excluding {key} ({rule:?})");
            excluded.push(path.clone());
        }
    }

    for path in excluded {
        remove_guarded(&path, guard_root)?;
        children.remove(&path);
        removed.push(path);
    }

    for child in children.values_mut() {
        prune_into(child, staging_root, rules, guard_root, removed)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, rel).unwrap();
    }

    #[test]
    fn snapshot_orders_siblings_by_path() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.txt");
        touch(dir.path(), "a/z.txt");
        touch(dir.path(), "a/y.txt");
        touch(dir.path(), "c/d/e.txt");

        let tree = snapshot(dir.path()).unwrap();
        let keys: Vec<_> = tree
            .children()
            .map(|c| c.path().strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(keys, [PathBuf::from("a"), "b.txt".into(), "c".into()]);

        let files: Vec<_> = tree
            .files()
            .into_iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            files,
            [PathBuf::from("a/y.txt"), "a/z.txt".into(), "b.txt".into(), "c/d/e.txt".into()]
        );
    }

    #[test]
    fn snapshot_of_missing_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = snapshot(&dir.path().join("nope")).unwrap_err();
        assert_eq!(err.kind(), crate::release::ErrorKind::Filesystem);
    }

    #[test]
    fn prune_removes_entries_from_tree_and_disk() {
        let guard = tempfile::tempdir().unwrap();
        let root = guard.path().join("prestashop");
        touch(&root, "a/keep.txt");
        touch(&root, "a/node_modules/x.js");
        touch(&root, "b.md");

        let rules = ExclusionRules::new()
            .with_pattern(".*node_modules.*")
            .unwrap()
            .with_pattern(r".*\.md$")
            .unwrap();
        let mut tree = snapshot(&root).unwrap();
        let removed = prune(&mut tree, &root, &rules, guard.path()).unwrap();

        assert_eq!(removed.len(), 2);
        assert_eq!(tree.files(), [root.join("a/keep.txt").as_path()]);
        assert!(tree.children().any(|c| c.path() == root.join("a")));
        assert!(!root.join("a/node_modules").exists());
        assert!(!root.join("b.md").exists());
        assert!(root.join("a/keep.txt").exists());
    }

    #[test]
    fn excluded_directory_children_are_never_tested() {
        let guard = tempfile::tempdir().unwrap();
        let root = guard.path().join("prestashop");
        touch(&root, "docs/keep-me.txt");

        // The folder rule removes `docs` before the pattern could spare or
        // match anything below it.
        let rules = ExclusionRules::new()
            .with_folder("docs")
            .with_pattern("keep-me")
            .unwrap();
        let mut tree = snapshot(&root).unwrap();
        let removed = prune(&mut tree, &root, &rules, guard.path()).unwrap();
        assert_eq!(removed, [root.join("docs")]);
        assert!(tree.files().is_empty());
    }

    #[test]
    fn prune_refuses_trees_outside_guard() {
        let guard = tempfile::tempdir().unwrap();
        let elsewhere = tempfile::tempdir().unwrap();
        touch(elsewhere.path(), "b.md");

        let rules = ExclusionRules::new().with_pattern(r".*\.md$").unwrap();
        let mut tree = snapshot(elsewhere.path()).unwrap();
        let err = prune(&mut tree, elsewhere.path(), &rules, guard.path()).unwrap_err();
        assert!(matches!(err, Error::SafetyViolation { .. }));
        assert!(elsewhere.path().join("b.md").exists());
    }
}
