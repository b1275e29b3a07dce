//! External tool configuration.

use std::time::Duration;

use serde::Deserialize;

/// Default timeout applied to every external command.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(3600);

/// Programs invoked across the subprocess boundary.
///
/// Each entry is a program name resolved through `PATH` or an absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    /// Source-control export (`git archive`).
    pub git: String,
    /// Dependency installation.
    pub composer: String,
    /// Asset compilation (`make assets`).
    pub make: String,
    /// Installer compiler interpreter.
    pub php: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            git: "git".into(),
            composer: "composer".into(),
            make: "make".into(),
            php: "php".into(),
        }
    }
}

/// Limits applied to external commands.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CommandLimits {
    /// Seconds before a command is killed.
    pub command_timeout_secs: u64,
}

impl Default for CommandLimits {
    fn default() -> Self {
        Self {
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT.as_secs(),
        }
    }
}

/// Entries appended after the shipped exclusion rules.
///
/// Paths are relative to the release root with `/` separators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExtraExclusions {
    /// Exact file paths.
    pub files: Vec<String>,
    /// Exact folder paths; the whole subtree goes.
    pub folders: Vec<String>,
    /// Unanchored regex patterns.
    pub patterns: Vec<String>,
}

/// Contents of the optional release configuration file.
///
/// ```toml
/// [tools]
/// composer = "/usr/local/bin/composer"
///
/// [limits]
/// command_timeout_secs = 900
///
/// [exclusions]
/// folders = ["docs"]
/// patterns = ['\.bak$']
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Program names.
    pub tools: ToolPaths,
    /// Command limits.
    pub limits: CommandLimits,
    /// Site-specific exclusions.
    pub exclusions: ExtraExclusions,
}

impl ToolConfig {
    /// Timeout for external commands.
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.limits.command_timeout_secs)
    }
}
