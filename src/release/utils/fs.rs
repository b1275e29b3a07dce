//! File system utilities for release staging.
//!
//! Every deletion goes through [`remove_guarded`], which refuses to touch
//! anything outside the job's temp root.

use crate::release::error::{Context, Error, ErrorExt, Result};
use std::{
    io,
    path::{Component, Path, PathBuf},
};

/// Lexically normalise `path` (drop `.`, resolve `..`) without touching the disk.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Fails with [`Error::SafetyViolation`] unless `path` lies strictly inside `root`.
pub fn ensure_within(path: &Path, root: &Path) -> Result<()> {
    let normalized = normalize(path);
    let root = normalize(root);
    if normalized != root && normalized.starts_with(&root) {
        Ok(())
    } else {
        Err(Error::SafetyViolation {
            path: path.to_path_buf(),
            allowed_root: root,
        })
    }
}

/// Removes a file, symlink or directory tree, provided it lives under `root`.
///
/// Missing paths are not an error.
pub fn remove_guarded(path: &Path, root: &Path) -> Result<()> {
    ensure_within(path, root)?;

    let metadata = match std::fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e).fs_context("reading metadata before removal", path),
    };

    if metadata.is_dir() {
        std::fs::remove_dir_all(path).fs_context("removing directory", path)
    } else {
        std::fs::remove_file(path).fs_context("removing file", path)
    }
}

/// Creates the given directory path, erasing it first if it exists.
pub fn recreate_dir(path: &Path, root: &Path) -> Result<()> {
    remove_guarded(path, root)?;
    std::fs::create_dir_all(path).fs_context("creating directory", path)
}

/// Creates all of the directories of the specified path.
pub fn create_dir_all(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).fs_context("creating directory", path)
}

/// Makes a symbolic link.
#[cfg(unix)]
fn symlink(target: &Path, link: &Path, _is_dir: bool) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

/// Makes a symbolic link.
#[cfg(windows)]
fn symlink(target: &Path, link: &Path, is_dir: bool) -> io::Result<()> {
    if is_dir {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}

/// Recursively copies a directory, preserving symlinks.
///
/// Fails if the source path is not a directory.
pub fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    if !from.is_dir() {
        return Err(Error::MissingPath {
            path: from.to_path_buf(),
            reason: "source of a directory copy".into(),
        });
    }

    for entry in walkdir::WalkDir::new(from) {
        let entry = entry?;
        let rel_path = entry
            .path()
            .strip_prefix(from)
            .context("walked outside copy root")?;
        let dest_path = to.join(rel_path);

        if entry.file_type().is_symlink() {
            let target = std::fs::read_link(entry.path()).fs_context("reading symlink", entry.path())?;
            symlink(&target, &dest_path, entry.path().is_dir())
                .fs_context("creating symlink", &dest_path)?;
        } else if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest_path).fs_context("creating directory", &dest_path)?;
        } else {
            std::fs::copy(entry.path(), &dest_path).fs_context("copying file", &dest_path)?;
        }
    }

    Ok(())
}

/// Fails with [`Error::TargetExists`] if anything, even a dangling symlink, is at `path`.
pub fn ensure_vacant(path: &Path) -> Result<()> {
    match std::fs::symlink_metadata(path) {
        Ok(_) => Err(Error::TargetExists {
            path: path.to_path_buf(),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).fs_context("checking move target", path),
    }
}

/// Moves `from` to `to`, falling back to copy-and-delete across filesystems.
///
/// `to` must not exist. The copy fallback deletes the source through
/// [`remove_guarded`], so `from` must be under `root` when the rename cannot
/// be done in place.
pub fn move_path(from: &Path, to: &Path, root: &Path) -> Result<()> {
    ensure_vacant(to)?;
    if let Some(parent) = to.parent() {
        create_dir_all(parent)?;
    }

    match std::fs::rename(from, to) {
        Ok(()) => return Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(e).fs_context("moving", from);
        }
        Err(e) => {
            log::debug!(
                "rename {} -> {} failed ({e}), copying instead",
                from.display(),
                to.display()
            );
        }
    }

    let metadata = std::fs::symlink_metadata(from).fs_context("reading metadata", from)?;
    if metadata.is_dir() {
        copy_dir(from, to)?;
    } else {
        std::fs::copy(from, to).fs_context("copying file", to)?;
    }
    remove_guarded(from, root)
}

/// Total size in bytes of a file or directory tree (symlinks not followed).
pub fn disk_usage(path: &Path) -> Result<u64> {
    let mut total = 0u64;
    for entry in walkdir::WalkDir::new(path).follow_links(false) {
        let entry = entry?;
        if entry.file_type().is_file() {
            total += entry.metadata().map_err(Error::from)?.len();
        }
    }
    Ok(total)
}

/// Human readable size, `du -h` style (`4.0K`, `12M`).
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["K", "M", "G", "T", "P"];
    if bytes < 1024 {
        return format!("{bytes}B");
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if size < 10.0 {
        format!("{:.1}{}", size, UNITS[unit])
    } else {
        format!("{:.0}{}", size, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_refuses_paths_outside_root() {
        let root = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let victim = outside.path().join("keep.txt");
        std::fs::write(&victim, "x").unwrap();

        let err = remove_guarded(&victim, root.path()).unwrap_err();
        assert!(matches!(err, Error::SafetyViolation { .. }));
        assert!(victim.exists());
    }

    #[test]
    fn guard_sees_through_parent_components() {
        let root = Path::new("/tmp/job");
        assert!(ensure_within(Path::new("/tmp/job/prestashop/a"), root).is_ok());
        assert!(ensure_within(Path::new("/tmp/job/../etc"), root).is_err());
        assert!(ensure_within(root, root).is_err());
    }

    #[test]
    fn remove_guarded_handles_trees_and_missing_paths() {
        let root = tempfile::tempdir().unwrap();
        let tree = root.path().join("a/b");
        std::fs::create_dir_all(&tree).unwrap();
        std::fs::write(tree.join("f"), "x").unwrap();

        remove_guarded(&root.path().join("a"), root.path()).unwrap();
        assert!(!root.path().join("a").exists());
        remove_guarded(&root.path().join("a"), root.path()).unwrap();
    }

    #[test]
    fn move_path_moves_directories() {
        let root = tempfile::tempdir().unwrap();
        let from = root.path().join("staging");
        std::fs::create_dir_all(from.join("sub")).unwrap();
        std::fs::write(from.join("sub/f.txt"), "hello").unwrap();
        let to = root.path().join("dest/prestashop");

        move_path(&from, &to, root.path()).unwrap();
        assert!(!from.exists());
        assert_eq!(std::fs::read_to_string(to.join("sub/f.txt")).unwrap(), "hello");
    }

    #[test]
    fn sizes_read_like_du() {
        assert_eq!(human_size(512), "512B");
        assert_eq!(human_size(4096), "4.0K");
        assert_eq!(human_size(15 * 1024 * 1024), "15M");
    }

    #[test]
    fn move_refuses_an_occupied_target() {
        let root = tempfile::tempdir().unwrap();
        let from = root.path().join("prestashop");
        std::fs::create_dir_all(&from).unwrap();
        std::fs::write(from.join("new.php"), "new").unwrap();

        let out = tempfile::tempdir().unwrap();
        let to = out.path().join("prestashop");
        std::fs::create_dir_all(&to).unwrap();
        std::fs::write(to.join("stale.php"), "old").unwrap();

        let err = move_path(&from, &to, root.path()).unwrap_err();
        assert!(matches!(err, Error::TargetExists { .. }), "{err}");
        assert!(from.join("new.php").exists());
        assert!(!to.join("new.php").exists());
        assert!(to.join("stale.php").exists());
    }

    #[test]
    fn move_refuses_to_replace_a_file() {
        let root = tempfile::tempdir().unwrap();
        let from = root.path().join("prestashop_8.1.0.xml");
        std::fs::write(&from, "new").unwrap();
        let to = root.path().join("out/prestashop_8.1.0.xml");
        std::fs::create_dir_all(to.parent().unwrap()).unwrap();
        std::fs::write(&to, "old").unwrap();

        assert!(move_path(&from, &to, root.path()).is_err());
        assert_eq!(std::fs::read_to_string(&to).unwrap(), "old");
    }
}
