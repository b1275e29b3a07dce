//! Error types for the release pipeline.
//!
//! Every failure is fatal for the job. [`Error::kind`] groups the variants into
//! the four categories the operator sees in the final diagnostic.

use std::{
    fmt::Display,
    io,
    path::{Path, PathBuf},
    time::Duration,
};

use super::builder::Stage;

/// Result type alias for release operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad category of a pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The job could not be configured (version, options).
    Configuration,
    /// A directory or file could not be created, read, written or moved.
    Filesystem,
    /// An external command could not run or exited unsuccessfully.
    ExternalCommand,
    /// A deletion outside the temp root was refused.
    SafetyViolation,
    /// Anything else (archive encoding, task join failures).
    Internal,
}

/// Errors raised by the release pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Required configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Filesystem operation failed on a specific path.
    #[error("{context} `{}`: {error}", path.display())]
    Fs {
        /// What was being attempted.
        context: String,
        /// Path the operation failed on.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        error: io::Error,
    },

    /// A folder the release layout depends on does not exist.
    #[error("expected `{}` to exist: {reason}", path.display())]
    MissingPath {
        /// Missing path.
        path: PathBuf,
        /// Why the path was needed.
        reason: String,
    },

    /// A move would replace something already at its target.
    #[error("refusing to overwrite existing `{}`", path.display())]
    TargetExists {
        /// Occupied target.
        path: PathBuf,
    },

    /// Command could not be started.
    #[error("failed to run `{command}`: {error}")]
    CommandSpawn {
        /// Rendered command line.
        command: String,
        /// Spawn error.
        #[source]
        error: io::Error,
    },

    /// Command exited with a non-zero status.
    #[error("`{command}` failed with exit code {}{}", display_code(*code), display_log(log.as_deref()))]
    CommandFailed {
        /// Rendered command line.
        command: String,
        /// Exit code, `None` when killed by a signal.
        code: Option<i32>,
        /// Log file holding the captured output.
        log: Option<PathBuf>,
    },

    /// Command did not finish within its timeout.
    #[error("`{command}` timed out after {}s", timeout.as_secs())]
    CommandTimeout {
        /// Rendered command line.
        command: String,
        /// Configured timeout.
        timeout: Duration,
    },

    /// Deletion refused because the path is not under the temp root.
    #[error("refusing to delete `{}`: it is not inside `{}`", path.display(), allowed_root.display())]
    SafetyViolation {
        /// Path that was about to be deleted.
        path: PathBuf,
        /// Root every deletion must stay under.
        allowed_root: PathBuf,
    },

    /// An exclusion pattern does not compile.
    #[error("invalid exclusion pattern `{pattern}`: {error}")]
    Pattern {
        /// Pattern source.
        pattern: String,
        /// Compile error.
        #[source]
        error: regex::Error,
    },

    /// A stage of the pipeline failed.
    #[error("{stage} failed: {source}")]
    StageFailed {
        /// Failing stage.
        stage: Stage,
        /// Cause.
        #[source]
        source: Box<Error>,
    },

    /// Zip encoding errors.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Directory walk errors.
    #[error("directory walk error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// Glob pattern errors.
    #[error("glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// IO errors without a known path.
    #[error("io error: {0}")]
    IoError(#[from] io::Error),

    /// Generic errors.
    #[error("{0}")]
    GenericError(String),
}

fn display_code(code: Option<i32>) -> String {
    code.map_or_else(|| "none (terminated by signal)".to_string(), |c| c.to_string())
}

fn display_log(log: Option<&Path>) -> String {
    log.map(|p| format!(" (output captured in `{}`)", p.display()))
        .unwrap_or_default()
}

impl Error {
    /// Category of this error, looking through stage wrappers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Configuration(_) | Error::Pattern { .. } => ErrorKind::Configuration,
            Error::Fs { .. }
            | Error::MissingPath { .. }
            | Error::TargetExists { .. }
            | Error::IoError(_)
            | Error::WalkDir(_) => ErrorKind::Filesystem,
            Error::CommandSpawn { .. } | Error::CommandFailed { .. } | Error::CommandTimeout { .. } => {
                ErrorKind::ExternalCommand
            }
            Error::SafetyViolation { .. } => ErrorKind::SafetyViolation,
            Error::StageFailed { source, .. } => source.kind(),
            Error::Zip(_) | Error::Glob(_) | Error::GenericError(_) => ErrorKind::Internal,
        }
    }

    /// Stage the error was raised in, if it went through the packager.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::StageFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Attach a path and description to filesystem errors.
pub trait ErrorExt<T> {
    /// Convert an I/O error into [`Error::Fs`] naming `path`.
    fn fs_context(self, context: &str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context: context.to_string(),
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}

/// Turn `None` or a foreign error into [`Error::GenericError`] with a message.
pub trait Context<T> {
    /// Attach `msg` to the failure.
    fn context<C: Display>(self, msg: C) -> Result<T>;
}

impl<T> Context<T> for Option<T> {
    fn context<C: Display>(self, msg: C) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(msg.to_string()))
    }
}

impl<T, E: Display> Context<T> for std::result::Result<T, E> {
    fn context<C: Display>(self, msg: C) -> Result<T> {
        self.map_err(|e| Error::GenericError(format!("{msg}: {e}")))
    }
}
