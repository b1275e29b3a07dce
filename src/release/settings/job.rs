//! The immutable description of one packaging run.

use std::path::{Path, PathBuf};

use super::{ToolConfig, VersionSpec};
use crate::release::cleanup::ExclusionRules;

/// Name of the staging directory created under the temp root.
pub const STAGING_DIR_NAME: &str = "prestashop";

/// One release packaging run.
///
/// Constructed through [`ReleaseJobBuilder`](super::ReleaseJobBuilder) and never
/// mutated afterwards.
#[derive(Debug, Clone)]
pub struct ReleaseJob {
    version: VersionSpec,
    use_zip: bool,
    use_installer: bool,
    keep_tests: bool,
    source_path: PathBuf,
    temp_root: PathBuf,
    staging_path: PathBuf,
    destination_path: PathBuf,
    tools: ToolConfig,
    exclusions: ExclusionRules,
}

impl ReleaseJob {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        version: VersionSpec,
        use_zip: bool,
        use_installer: bool,
        keep_tests: bool,
        source_path: PathBuf,
        temp_root: PathBuf,
        destination_path: PathBuf,
        tools: ToolConfig,
        exclusions: ExclusionRules,
    ) -> Self {
        let staging_path = temp_root.join(STAGING_DIR_NAME);
        Self {
            version,
            use_zip,
            use_installer,
            keep_tests,
            source_path,
            temp_root,
            staging_path,
            destination_path,
            tools,
            exclusions,
        }
    }

    /// Release version.
    pub fn version(&self) -> &VersionSpec {
        &self.version
    }

    /// Whether the staged tree is compressed.
    pub fn use_zip(&self) -> bool {
        self.use_zip
    }

    /// Whether the installer bundle wraps the archive. Always false without zip.
    pub fn use_installer(&self) -> bool {
        self.use_installer
    }

    /// Whether test, VCS and docker files survive into the release.
    pub fn keep_tests(&self) -> bool {
        self.keep_tests
    }

    /// Source working tree (must be a git checkout).
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Root every deletion must stay under.
    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    /// Isolated copy of the source tree that gets mutated and pruned.
    pub fn staging_path(&self) -> &Path {
        &self.staging_path
    }

    /// Directory receiving the final artifacts.
    pub fn destination_path(&self) -> &Path {
        &self.destination_path
    }

    /// External tool settings.
    pub fn tools(&self) -> &ToolConfig {
        &self.tools
    }

    /// Exclusion rules for the cleanup stage, fixed when the job was built.
    pub fn exclusion_rules(&self) -> &ExclusionRules {
        &self.exclusions
    }

    /// `prestashop_<version>.zip`
    pub fn archive_file_name(&self) -> String {
        format!("{}.zip", self.version.artifact_stem())
    }

    /// `prestashop_<version>.xml`
    pub fn manifest_file_name(&self) -> String {
        format!("{}.xml", self.version.artifact_stem())
    }

    /// Directory holding the dependency-install and asset-build logs.
    pub fn log_dir(&self) -> PathBuf {
        self.source_path.join("var").join("logs")
    }
}
