//! Checksum manifest generation and archive digests.
//!
//! The manifest lists every shipped file with its MD5 (or its target, for
//! symlinks), nested by directory:
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8" ?>
//! <checksum_list>
//! 	<ps_root_dir version="8.1.0">
//! 		<dir name="a">
//! 			<md5file name="keep.txt">...</md5file>
//! 		</dir>
//! 	</ps_root_dir>
//! </checksum_list>
//! ```
//!
//! An entry at depth `n` below the staging root (1 for root-level entries) is
//! indented with `n + 1` tabs.

use crate::release::{
    cleanup::TreeNode,
    error::{ErrorExt, Result},
    settings::VersionSpec,
};
use sha2::{Digest, Sha256};
use std::{
    io::Read,
    path::{Path, PathBuf},
};
use tokio::io::AsyncReadExt;

const EOL: &str = "\n";

/// One manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecksumEntry {
    /// Regular file and its MD5.
    File {
        /// Absolute path.
        path: PathBuf,
        /// Lower-case hex MD5 of the content.
        hash: String,
    },
    /// Symlink and its target as stored in the link.
    Symlink {
        /// Absolute path.
        path: PathBuf,
        /// Link target.
        target: String,
    },
    /// Directory and its entries in path order.
    Dir {
        /// Absolute path.
        path: PathBuf,
        /// Entries.
        children: Vec<ChecksumEntry>,
    },
}

/// Manifest written to disk, handed from the manifest stage to the move stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestHandoff {
    /// Where the manifest currently lives.
    pub path: PathBuf,
    /// Number of file and symlink entries.
    pub entries: usize,
}

/// MD5 of a file, lower-case hex.
///
/// Reads the file in 8KB chunks.
pub fn md5_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path).fs_context("opening file for hashing", path)?;
    let mut context = md5::Context::new();
    let mut buffer = [0u8; 8192];

    loop {
        let n = file
            .read(&mut buffer)
            .fs_context("reading file for hashing", path)?;
        if n == 0 {
            break;
        }
        context.consume(&buffer[..n]);
    }

    Ok(format!("{:x}", md5::Digest::from(context)))
}

/// Hash every leaf of the pruned tree, depth-first in path order.
pub fn collect_entries(node: &TreeNode) -> Result<Vec<ChecksumEntry>> {
    node.children().map(entry_for).collect()
}

fn entry_for(node: &TreeNode) -> Result<ChecksumEntry> {
    match node {
        TreeNode::Dir { path, .. } => Ok(ChecksumEntry::Dir {
            path: path.clone(),
            children: collect_entries(node)?,
        }),
        TreeNode::File(path) => {
            let metadata =
                std::fs::symlink_metadata(path).fs_context("reading file metadata", path)?;
            if metadata.file_type().is_symlink() {
                let target = std::fs::read_link(path).fs_context("reading symlink", path)?;
                Ok(ChecksumEntry::Symlink {
                    path: path.clone(),
                    target: target.to_string_lossy().into_owned(),
                })
            } else {
                Ok(ChecksumEntry::File {
                    path: path.clone(),
                    hash: md5_file(path)?,
                })
            }
        }
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| escape(&n.to_string_lossy()))
        .unwrap_or_default()
}

fn depth(path: &Path, staging_root: &Path) -> usize {
    path.strip_prefix(staging_root)
        .map(|rel| rel.components().count())
        .unwrap_or(0)
}

fn render(entries: &[ChecksumEntry], staging_root: &Path, out: &mut String) {
    for entry in entries {
        match entry {
            ChecksumEntry::File { path, hash } => {
                let indent = "\t".repeat(depth(path, staging_root) + 1);
                out.push_str(&format!(
                    "{indent}<md5file name=\"{}\">{hash}</md5file>{EOL}",
                    base_name(path)
                ));
            }
            ChecksumEntry::Symlink { path, target } => {
                let indent = "\t".repeat(depth(path, staging_root) + 1);
                out.push_str(&format!(
                    "{indent}<link name=\"{}\">{}</link>{EOL}",
                    base_name(path),
                    escape(target)
                ));
            }
            ChecksumEntry::Dir { path, children } => {
                let indent = "\t".repeat(depth(path, staging_root) + 1);
                out.push_str(&format!("{indent}<dir name=\"{}\">{EOL}", base_name(path)));
                render(children, staging_root, out);
                out.push_str(&format!("{indent}</dir>{EOL}"));
            }
        }
    }
}

/// Count of file and symlink entries.
pub fn leaf_count(entries: &[ChecksumEntry]) -> usize {
    entries
        .iter()
        .map(|e| match e {
            ChecksumEntry::Dir { children, .. } => leaf_count(children),
            _ => 1,
        })
        .sum()
}

/// Render the manifest for an already hashed tree.
pub fn render_manifest(entries: &[ChecksumEntry], staging_root: &Path, version: &VersionSpec) -> String {
    let mut body = String::new();
    render(entries, staging_root, &mut body);

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" ?>{EOL}\
         <checksum_list>{EOL}\
         \t<ps_root_dir version=\"{}\">{EOL}\
         {body}\
         \t</ps_root_dir>{EOL}\
         </checksum_list>{EOL}",
        escape(version.as_str())
    )
}

/// Build the manifest text for the pruned tree rooted at `staging_root`.
pub fn build_manifest(tree: &TreeNode, staging_root: &Path, version: &VersionSpec) -> Result<String> {
    let entries = collect_entries(tree)?;
    Ok(render_manifest(&entries, staging_root, version))
}

/// Build the manifest and write it to `path`.
pub fn write_manifest(
    tree: &TreeNode,
    staging_root: &Path,
    version: &VersionSpec,
    path: &Path,
) -> Result<ManifestHandoff> {
    let entries = collect_entries(tree)?;
    let content = render_manifest(&entries, staging_root, version);
    std::fs::write(path, content).fs_context("writing checksum manifest", path)?;
    Ok(ManifestHandoff {
        path: path.to_path_buf(),
        entries: leaf_count(&entries),
    })
}

/// Calculates the SHA-256 of a release archive.
///
/// Reads the file in 8KB chunks.
pub async fn calculate_sha256(file_path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(file_path)
        .await
        .fs_context("opening archive for hashing", file_path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    loop {
        let n = file
            .read(&mut buffer)
            .await
            .fs_context("reading archive for hashing", file_path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
