//! Version and debug constant rewriting in staged configuration files.
//!
//! Each target file has its own transform, a pure `&str -> String` function,
//! and an `apply_*` wrapper that reads and rewrites the file in place.

use crate::release::{
    error::{Error, ErrorExt, Result},
    settings::VersionSpec,
};
use regex::{NoExpand, Regex};
use std::path::Path;

/// Defines file, relative to the staging root.
pub const DEFINES_FILE: &str = "config/defines.inc.php";
/// Application kernel, relative to the staging root.
pub const KERNEL_FILE: &str = "app/AppKernel.php";
/// Installer configuration data (optional).
pub const INSTALL_CONFIGURATION_FILE: &str = "install-dev/data/xml/configuration.xml";
/// Installer version file.
pub const INSTALL_VERSION_FILE: &str = "install-dev/install_version.php";

fn regex(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|error| Error::Pattern {
        pattern: pattern.to_string(),
        error,
    })
}

/// Forces `_PS_MODE_DEV_` and `_PS_DISPLAY_COMPATIBILITY_WARNING_` to `false`.
///
/// The whole line holding the definition is replaced.
pub fn disable_debug_defines(content: &str) -> Result<String> {
    let mode_dev = regex(r#"(?iU)(.*(define).*)["']_PS_MODE_DEV_["'](.*);"#)?;
    let content = mode_dev.replace_all(content, NoExpand("define('_PS_MODE_DEV_', false);"));

    let compat = regex(r#"(?iU)(.*)["']_PS_DISPLAY_COMPATIBILITY_WARNING_["'](.*);"#)?;
    let content = compat.replace_all(
        &content,
        NoExpand("define('_PS_DISPLAY_COMPATIBILITY_WARNING_', false);"),
    );

    Ok(content.into_owned())
}

/// Rewrites the kernel's version constants.
pub fn set_kernel_version(content: &str, version: &VersionSpec) -> Result<String> {
    let rewrites = [
        (
            r"const VERSION = '(.*)';",
            format!("const VERSION = '{}';", version.as_str()),
        ),
        (
            r"const MAJOR_VERSION_STRING = '(.*)';",
            format!(
                "const MAJOR_VERSION_STRING = '{}';",
                version.major_version_string()
            ),
        ),
        (
            r"const MAJOR_VERSION = (.*);",
            format!("const MAJOR_VERSION = {};", version.major()),
        ),
        (
            r"const MINOR_VERSION = (.*);",
            format!("const MINOR_VERSION = {};", version.minor()),
        ),
        (
            r"const RELEASE_VERSION = (.*);",
            format!("const RELEASE_VERSION = {};", version.release()),
        ),
    ];

    let mut content = content.to_string();
    for (pattern, replacement) in rewrites {
        content = regex(pattern)?
            .replace_all(&content, NoExpand(&replacement))
            .into_owned();
    }
    Ok(content)
}

/// Forces the Smarty force-compile and console settings to `0`.
pub fn disable_smarty_debug(content: &str) -> Result<String> {
    let mut content = content.to_string();
    for name in ["PS_SMARTY_FORCE_COMPILE", "PS_SMARTY_CONSOLE"] {
        let pattern = regex(&format!(r#"(?si)name="{name}"(.*?)value>(\d*)"#))?;
        content = pattern
            .replace_all(&content, format!(r#"name="{name}"${{1}}value>0"#).as_str())
            .into_owned();
    }
    Ok(content)
}

/// Sets `_PS_INSTALL_VERSION_` to the release version.
pub fn set_install_version(content: &str, version: &VersionSpec) -> Result<String> {
    let pattern = regex(r"_PS_INSTALL_VERSION_', '(.*)'\)")?;
    let replacement = format!("_PS_INSTALL_VERSION_', '{}')", version.as_str());
    Ok(pattern
        .replace_all(content, NoExpand(&replacement))
        .into_owned())
}

/// Reads `path`, runs `transform` and writes the result back.
pub fn rewrite_file<F>(path: &Path, transform: F) -> Result<()>
where
    F: FnOnce(&str) -> Result<String>,
{
    let content = std::fs::read_to_string(path).fs_context("reading file to rewrite", path)?;
    let rewritten = transform(&content)?;
    std::fs::write(path, rewritten).fs_context("updating contents of", path)
}

/// Applies every constant rewrite below `staging_root`.
///
/// The installer configuration file is skipped when absent; every other
/// target must exist.
pub fn apply_all(staging_root: &Path, version: &VersionSpec) -> Result<()> {
    rewrite_file(&staging_root.join(DEFINES_FILE), disable_debug_defines)?;

    let configuration = staging_root.join(INSTALL_CONFIGURATION_FILE);
    if configuration.exists() {
        rewrite_file(&configuration, disable_smarty_debug)?;
    } else {
        log::debug!("{} not present, skipping", configuration.display());
    }

    rewrite_file(&staging_root.join(INSTALL_VERSION_FILE), |c| {
        set_install_version(c, version)
    })?;
    rewrite_file(&staging_root.join(KERNEL_FILE), |c| set_kernel_version(c, version))
}
