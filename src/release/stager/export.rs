//! Export of the committed source tree into the staging directory.
//!
//! `git archive HEAD` writes a tar file under the temp root, which is then
//! unpacked into staging, so only committed content reaches the release.

use crate::release::{
    error::{ErrorExt, Result},
    utils::{blocking, fs::recreate_dir, process::ExternalCommand},
};
use std::{path::Path, time::Duration};

/// Replace `staging` with the committed tree of `source`.
///
/// Any existing directory at `staging` is deleted first (it must be under
/// `temp_root`). The `git archive` run is bounded by `timeout`.
pub async fn export_committed(
    git: &str,
    source: &Path,
    staging: &Path,
    temp_root: &Path,
    timeout: Duration,
) -> Result<()> {
    {
        let staging = staging.to_path_buf();
        let temp_root = temp_root.to_path_buf();
        blocking("staging reset", move || recreate_dir(&staging, &temp_root)).await?;
    }

    let archive = tempfile::Builder::new()
        .prefix("source-export")
        .suffix(".tar")
        .tempfile_in(temp_root)
        .fs_context("creating export archive in", temp_root)?;

    ExternalCommand::new(git, timeout)
        .args(["archive", "--format=tar", "-o"])
        .arg(archive.path())
        .arg("HEAD")
        .current_dir(source)
        .output()
        .await?;
    log::debug!("unpacking {} into {}", archive.path().display(), staging.display());

    let staging = staging.to_path_buf();
    blocking("source unpack", move || {
        let file = archive
            .reopen()
            .fs_context("opening export archive", archive.path())?;
        tar::Archive::new(file)
            .unpack(&staging)
            .fs_context("unpacking committed tree into", &staging)
    })
    .await
}
