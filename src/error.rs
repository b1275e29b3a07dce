//! Application-level error types.
//!
//! Pipeline failures live in [`crate::release::Error`]; this module wraps them
//! together with command line and configuration file failures.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for application operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type of the release tool
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Pipeline errors
    #[error("{0}")]
    Release(#[from] crate::release::Error),

    /// Generic errors from anyhow
    #[error("{0:#}")]
    Anyhow(#[from] anyhow::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Source tree does not exist or is not a directory
    #[error("Source directory not found: {}", path.display())]
    SourceNotFound {
        /// Path given on the command line
        path: PathBuf,
    },
}

impl ReleaseError {
    /// Hints printed under the fatal diagnostic.
    pub fn recovery_suggestions(&self) -> Vec<String> {
        use crate::release::ErrorKind;

        match self {
            ReleaseError::Release(e) => match e.kind() {
                ErrorKind::Configuration => {
                    vec!["Pass --version or check src/Core/Version.php in the source tree".into()]
                }
                ErrorKind::ExternalCommand => vec![
                    "Check the command log named above".into(),
                    "Tool paths and timeouts can be set in the --config file".into(),
                ],
                ErrorKind::SafetyViolation => {
                    vec!["Check --temp-dir: every deletion must stay inside it".into()]
                }
                ErrorKind::Filesystem | ErrorKind::Internal => Vec::new(),
            },
            ReleaseError::Cli(_) => vec!["Run with --help for usage".into()],
            _ => Vec::new(),
        }
    }
}
