//! Configuration structures for a release run.
//!
//! A [`ReleaseJob`] is assembled once by [`ReleaseJobBuilder`] and stays
//! immutable while the pipeline runs.

mod builder;
mod job;
mod tools;
mod version;

pub use builder::{RELEASES_DIR_RELATIVE_PATH, ReleaseJobBuilder};
pub use job::{ReleaseJob, STAGING_DIR_NAME};
pub use tools::{CommandLimits, DEFAULT_COMMAND_TIMEOUT, ExtraExclusions, ToolConfig, ToolPaths};
pub use version::VersionSpec;
