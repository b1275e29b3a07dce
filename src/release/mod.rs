//! Release packaging pipeline.
//!
//! Turns a shop source tree into a versioned, integrity-verifiable
//! distributable:
//!
//! - [`stager`] exports the committed tree and normalises it for production
//! - [`cleanup`] snapshots the staged tree and prunes excluded entries
//! - [`builder`] writes the checksum manifest, assembles archives and
//!   orchestrates the stages through [`Packager`]
//!
//! Every stage completes before the next one starts and the first failure
//! ends the job.

pub mod builder;
pub mod cleanup;
pub mod error;
pub mod settings;
pub mod stager;
pub mod utils;

pub use builder::{ArchiveOutput, ArtifactKind, Packager, ReleaseArtifact, Stage};
pub use cleanup::{ExclusionRules, TreeNode, should_exclude};
pub use error::{Error, ErrorKind, Result};
pub use settings::{
    RELEASES_DIR_RELATIVE_PATH, ReleaseJob, ReleaseJobBuilder, STAGING_DIR_NAME, ToolConfig,
    VersionSpec,
};
