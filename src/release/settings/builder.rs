//! Builder for constructing a [`ReleaseJob`].

use super::{ReleaseJob, ToolConfig, VersionSpec};
use crate::release::{Error, Result, cleanup::ExclusionRules};
use std::path::{Path, PathBuf};

/// Where releases land when no destination is given, relative to the source.
pub const RELEASES_DIR_RELATIVE_PATH: &str = "tools/build/releases";

/// Builder for constructing [`ReleaseJob`].
///
/// # Examples
///
/// ```no_run
/// use prestashop_release::release::ReleaseJobBuilder;
///
/// # fn example() -> prestashop_release::release::Result<()> {
/// let job = ReleaseJobBuilder::new()
///     .source_path("/srv/prestashop")
///     .version("8.1.2")
///     .use_installer(false)
///     .destination_path("/srv/releases")
///     .build()?;
/// assert_eq!(job.archive_file_name(), "prestashop_8.1.2.zip");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ReleaseJobBuilder {
    source_path: Option<PathBuf>,
    version: Option<String>,
    use_zip: bool,
    use_installer: bool,
    keep_tests: bool,
    temp_root: Option<PathBuf>,
    destination_path: Option<PathBuf>,
    tools: ToolConfig,
}

impl Default for ReleaseJobBuilder {
    fn default() -> Self {
        Self {
            source_path: None,
            version: None,
            use_zip: true,
            use_installer: true,
            keep_tests: false,
            temp_root: None,
            destination_path: None,
            tools: ToolConfig::default(),
        }
    }
}

impl ReleaseJobBuilder {
    /// Creates a new builder with zip and installer enabled.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the source working tree.
    ///
    /// # Required
    pub fn source_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.source_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the release version.
    ///
    /// Default: read from `src/Core/Version.php` in the source tree.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Compress the release. Default: true
    pub fn use_zip(mut self, yes: bool) -> Self {
        self.use_zip = yes;
        self
    }

    /// Wrap the archive in the installer bundle. Default: true
    pub fn use_installer(mut self, yes: bool) -> Self {
        self.use_installer = yes;
        self
    }

    /// Keep tests, VCS and docker files. Default: false
    pub fn keep_tests(mut self, yes: bool) -> Self {
        self.keep_tests = yes;
        self
    }

    /// Root directory under which the staging directory is created.
    ///
    /// Default: the system temp directory.
    pub fn temp_root<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.temp_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Destination directory for the artifacts.
    ///
    /// Default: `<source>/tools/build/releases/<version>_<YYYYmmdd_HHMMSS>`.
    pub fn destination_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.destination_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// External tool configuration.
    pub fn tools(mut self, tools: ToolConfig) -> Self {
        self.tools = tools;
        self
    }

    /// Builds the job.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the source path is missing, the
    /// version can neither be parsed nor discovered, or a configured
    /// exclusion pattern does not compile.
    pub fn build(self) -> Result<ReleaseJob> {
        let source_path = self
            .source_path
            .ok_or_else(|| Error::Configuration("source_path is required".into()))?;

        let raw_version = match self.version {
            Some(v) if !v.trim().is_empty() => v,
            _ => crate::metadata::read_current_version(&source_path).map_err(|e| {
                Error::Configuration(format!(
                    "version is not provided and cannot be found in project: {e}"
                ))
            })?,
        };
        let version = VersionSpec::parse(&raw_version)?;

        if self.use_installer && !self.use_zip {
            log::warn!("installer bundle requires a zipped release; building without installer");
        }
        let use_installer = self.use_installer && self.use_zip;

        let exclusions =
            ExclusionRules::defaults(self.keep_tests)?.with_extra(&self.tools.exclusions)?;

        let temp_root = self.temp_root.unwrap_or_else(std::env::temp_dir);

        let destination_path = self.destination_path.unwrap_or_else(|| {
            let reference = format!(
                "{}_{}",
                version.as_str(),
                chrono::Local::now().format("%Y%m%d_%H%M%S")
            );
            source_path.join(RELEASES_DIR_RELATIVE_PATH).join(reference)
        });

        Ok(ReleaseJob::new(
            version,
            self.use_zip,
            use_installer,
            self.keep_tests,
            source_path,
            temp_root,
            destination_path,
            self.tools,
            exclusions,
        ))
    }
}
