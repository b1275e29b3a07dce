//! Production folder layout.

use crate::release::error::{Error, ErrorExt, Result};
use std::path::Path;

/// Folders created when missing, relative to the staging root.
pub const REQUIRED_FOLDERS: &[&str] = &["var/cache", "var/logs"];

/// Development folder names and their production names.
pub const FOLDER_RENAMES: &[(&str, &str)] = &[("admin-dev", "admin"), ("install-dev", "install")];

/// Creates the runtime folders and renames the development folders.
///
/// A development folder that does not exist is fatal.
pub fn prepare_folders(staging_root: &Path) -> Result<()> {
    for folder in REQUIRED_FOLDERS {
        let path = staging_root.join(folder);
        std::fs::create_dir_all(&path).fs_context("creating directory", &path)?;
    }

    for (old, new) in FOLDER_RENAMES {
        let from = staging_root.join(old);
        let to = staging_root.join(new);
        if !from.exists() {
            return Err(Error::MissingPath {
                path: from,
                reason: format!("unable to rename {old} to {new}"),
            });
        }
        std::fs::rename(&from, &to).fs_context("renaming folder", &from)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renames_dev_folders() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("admin-dev/themes")).unwrap();
        std::fs::create_dir_all(dir.path().join("install-dev")).unwrap();

        prepare_folders(dir.path()).unwrap();
        assert!(dir.path().join("admin/themes").is_dir());
        assert!(dir.path().join("install").is_dir());
        assert!(!dir.path().join("admin-dev").exists());
        assert!(dir.path().join("var/logs").is_dir());
    }

    #[test]
    fn missing_dev_folder_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("admin-dev")).unwrap();
        let err = prepare_folders(dir.path()).unwrap_err();
        assert!(matches!(err, Error::MissingPath { .. }));
        assert!(err.to_string().contains("install-dev"));
    }
}
