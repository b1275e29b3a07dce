//! Release orchestration and artifact assembly.
//!
//! This module provides the [`Packager`] orchestrator that drives a
//! [`ReleaseJob`](crate::release::ReleaseJob) through every stage of the
//! pipeline, strictly one after the other.
//!
//! # Overview
//!
//! The packager:
//! 1. Exports the committed tree into the staging directory
//! 2. Normalises constants, licences and cache markers
//! 3. Installs dependencies and builds assets
//! 4. Prunes excluded entries and writes the checksum manifest
//! 5. Zips the release (optionally wrapped in the installer bundle)
//! 6. Moves the artifact and its manifest to the destination
//!
//! # Example
//!
//! ```no_run
//! use prestashop_release::cli::OutputManager;
//! use prestashop_release::release::{Packager, ReleaseJobBuilder};
//!
//! # async fn example() -> prestashop_release::release::Result<()> {
//! let job = ReleaseJobBuilder::new()
//!     .source_path("/srv/prestashop")
//!     .version("8.1.0")
//!     .build()?;
//!
//! let artifact = Packager::new(job, OutputManager::new(true, false))
//!     .package()
//!     .await?;
//! println!("Created: {} ({} bytes)", artifact.path.display(), artifact.size);
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`archive`] - zip assembly for the payload and the installer bundle
//! - [`checksum`] - MD5 manifest and SHA-256 archive digest
//! - [`orchestrator`] - main [`Packager`] struct and stage sequencing
//! - [`tool_detection`] - external tool availability checking

pub mod archive;
pub mod checksum;
mod orchestrator;
pub mod tool_detection;

use std::{fmt, path::PathBuf};

pub use orchestrator::{Packager, ReleaseArtifact};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Tool probing, work directory and destination creation.
    Init,
    /// Export of the committed tree into the staging directory.
    Stage,
    /// Version and debug constant rewriting.
    ApplyVersionConstants,
    /// Aggregated LICENSES file.
    GenerateLicenses,
    /// CACHEDIR.TAG markers.
    GenerateCacheTags,
    /// Production dependency installation.
    InstallDependencies,
    /// Front-end asset compilation.
    BuildAssets,
    /// Folder preparation and exclusion pruning.
    Clean,
    /// Checksum manifest generation.
    GenerateManifest,
    /// Release archive and installer bundle.
    Archive,
    /// Relocation into the destination directory.
    Move,
    /// Terminal success state.
    Done,
}

impl Stage {
    /// Operator-facing description.
    pub fn description(self) -> &'static str {
        match self {
            Stage::Init => "Preparing release job",
            Stage::Stage => "Exporting committed sources",
            Stage::ApplyVersionConstants => "Setting version constants",
            Stage::GenerateLicenses => "Generating LICENSES file",
            Stage::GenerateCacheTags => "Generating CACHEDIR.TAG files",
            Stage::InstallDependencies => "Installing dependencies",
            Stage::BuildAssets => "Building assets",
            Stage::Clean => "Cleaning release tree",
            Stage::GenerateManifest => "Generating checksum manifest",
            Stage::Archive => "Creating archive",
            Stage::Move => "Moving release",
            Stage::Done => "Done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::Stage => "stage",
            Stage::ApplyVersionConstants => "apply-version-constants",
            Stage::GenerateLicenses => "generate-licenses",
            Stage::GenerateCacheTags => "generate-cache-tags",
            Stage::InstallDependencies => "install-dependencies",
            Stage::BuildAssets => "build-assets",
            Stage::Clean => "clean",
            Stage::GenerateManifest => "generate-manifest",
            Stage::Archive => "archive",
            Stage::Move => "move",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Kind of deliverable produced by a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// `prestashop_<version>.zip` holding the release tree.
    Zip,
    /// Zip holding the payload archive, the unpacker and the docs.
    InstallerBundle,
    /// The cleaned staging directory itself.
    Directory,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Zip => write!(f, "zip archive"),
            ArtifactKind::InstallerBundle => write!(f, "installer bundle"),
            ArtifactKind::Directory => write!(f, "directory"),
        }
    }
}

/// Files produced by the archive stage, still inside the work directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveOutput {
    /// Deliverable kind.
    pub kind: ArtifactKind,
    /// Deliverable path (the staging directory when not zipped).
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_ordered_and_named() {
        assert!(Stage::Init < Stage::Stage);
        assert!(Stage::BuildAssets < Stage::Clean);
        assert!(Stage::Clean < Stage::GenerateManifest);
        assert!(Stage::Move < Stage::Done);
        assert_eq!(Stage::InstallDependencies.to_string(), "install-dependencies");
    }
}
