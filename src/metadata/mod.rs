//! Project metadata discovery from the shop source tree and the tool config file.

use crate::error::{CliError, ReleaseError, Result};
use crate::release::ToolConfig;
use anyhow::Context;
use regex::Regex;
use std::path::Path;

/// Version class, relative to the source tree.
pub const VERSION_FILE: &str = "src/Core/Version.php";

/// Reads the current version from the `VERSION` constant of the source tree.
pub fn read_current_version(source_path: &Path) -> Result<String> {
    let version_file = source_path.join(VERSION_FILE);
    let content = std::fs::read_to_string(&version_file).map_err(|e| {
        ReleaseError::Cli(CliError::InvalidArguments {
            reason: format!("Failed to read {}: {}", version_file.display(), e),
        })
    })?;

    let pattern = Regex::new(r"const VERSION = '(.*)';").map_err(anyhow::Error::from)?;
    pattern
        .captures(&content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            ReleaseError::Cli(CliError::InvalidArguments {
                reason: format!("No VERSION constant in {}", version_file.display()),
            })
        })
}

/// Loads the tool configuration file, or defaults when no file is given.
pub fn load_tool_config(path: Option<&Path>) -> Result<ToolConfig> {
    let Some(path) = path else {
        return Ok(ToolConfig::default());
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: ToolConfig = toml::from_str(&content)?;
    log::info!("Loaded tool configuration from {}", path.display());
    Ok(config)
}
