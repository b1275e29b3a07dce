//! Generated marker files: CACHEDIR.TAG and the aggregated LICENSES file.

use crate::release::error::{Error, ErrorExt, Result};
use regex::Regex;
use std::path::{Path, PathBuf};

/// Cache directory tag, see <http://www.brynosaurus.com/cachedir/>.
pub const CACHEDIR_TAG_CONTENT: &str = "Signature: 8a477f597d28d172789f06886806bc55
# This file is a cache directory tag created by PrestaShop.
# For information about cache directory tags, see:
#\thttp://www.brynosaurus.com/cachedir/";

/// Directories receiving a CACHEDIR.TAG, relative to the staging root.
pub const CACHEDIR_LOCATIONS: &[&str] = &["img/tmp", "var/cache"];

/// Name of the aggregated licence file at the staging root.
pub const LICENSES_FILE: &str = "LICENSES";

const LICENSE_PATTERN: &str = r"(?i)^.*/.*license(\.txt)?$";

/// Writes CACHEDIR.TAG into every cache location.
///
/// The locations must already exist in the staged tree.
pub fn write_cachedir_tags(staging_root: &Path) -> Result<Vec<PathBuf>> {
    CACHEDIR_LOCATIONS
        .iter()
        .map(|location| {
            let path = staging_root.join(location).join("CACHEDIR.TAG");
            std::fs::write(&path, CACHEDIR_TAG_CONTENT).fs_context("unable to create", &path)?;
            Ok(path)
        })
        .collect()
}

/// Concatenates every licence file under `staging_root` into `LICENSES`.
///
/// Files are visited in path order; each is followed by a blank CRLF line.
/// Returns how many files were aggregated.
pub fn write_licenses_file(staging_root: &Path) -> Result<usize> {
    let pattern = Regex::new(LICENSE_PATTERN).map_err(|error| Error::Pattern {
        pattern: LICENSE_PATTERN.to_string(),
        error,
    })?;

    let mut content = Vec::new();
    let mut count = 0;
    for entry in walkdir::WalkDir::new(staging_root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || !pattern.is_match(&entry.path().to_string_lossy()) {
            continue;
        }
        let bytes = std::fs::read(entry.path()).fs_context("reading licence file", entry.path())?;
        content.extend_from_slice(&bytes);
        content.extend_from_slice(b"\r\n\r\n");
        count += 1;
    }

    let target = staging_root.join(LICENSES_FILE);
    std::fs::write(&target, content).fs_context("unable to create", &target)?;
    Ok(count)
}
