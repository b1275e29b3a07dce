//! Zip assembly for the release payload and the installer bundle.

use crate::release::error::{Context, ErrorExt, Result};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

/// Name of the payload archive inside the installer bundle.
pub const INSTALLER_ZIP_FILENAME: &str = "prestashop.zip";

fn options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

#[cfg(unix)]
fn mode_of(metadata: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
fn mode_of(metadata: &std::fs::Metadata) -> u32 {
    if metadata.is_dir() { 0o755 } else { 0o644 }
}

fn entry_name(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Zips the content of `source_dir` (not the directory itself) into `archive`.
///
/// Entries are written in file-name order; symlinks are stored as links.
pub fn zip_directory(source_dir: &Path, archive: &Path) -> Result<()> {
    let file = File::create(archive).fs_context("creating archive", archive)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));

    for entry in walkdir::WalkDir::new(source_dir)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(source_dir)
            .context("walked outside archive root")?;
        let name = entry_name(rel);
        let metadata = std::fs::symlink_metadata(entry.path())
            .fs_context("reading metadata for archive", entry.path())?;

        if entry.file_type().is_symlink() {
            let target = std::fs::read_link(entry.path()).fs_context("reading symlink", entry.path())?;
            zip.add_symlink(name, target.to_string_lossy().into_owned(), options())?;
        } else if entry.file_type().is_dir() {
            zip.add_directory(format!("{name}/"), options().unix_permissions(mode_of(&metadata)))?;
        } else {
            zip.start_file(name, options().unix_permissions(mode_of(&metadata)))?;
            let mut input = File::open(entry.path()).fs_context("opening file for archive", entry.path())?;
            std::io::copy(&mut input, &mut zip).fs_context("adding file to archive", entry.path())?;
        }
    }

    finish(zip, archive)
}

/// Writes an archive holding `files`, each stored at the root under the given name.
pub fn zip_files(files: &[(String, PathBuf)], archive: &Path) -> Result<()> {
    let file = File::create(archive).fs_context("creating archive", archive)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));

    for (name, path) in files {
        zip.start_file(name.clone(), options())?;
        let mut input = File::open(path).fs_context("opening file for archive", path)?;
        std::io::copy(&mut input, &mut zip).fs_context("adding file to archive", path)?;
    }

    finish(zip, archive)
}

fn finish(zip: ZipWriter<BufWriter<File>>, archive: &Path) -> Result<()> {
    let mut writer = zip.finish()?;
    writer.flush().fs_context("flushing archive", archive)?;
    Ok(())
}
