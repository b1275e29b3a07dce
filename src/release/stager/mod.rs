//! Workspace staging.
//!
//! Produces an isolated copy of the committed source tree and normalises it
//! for production: version constants, marker files, dependencies, assets and
//! folder names.
//!
//! - [`export`] - committed tree export
//! - [`constants`] - version and debug constant rewriting
//! - [`markers`] - CACHEDIR.TAG and LICENSES generation
//! - [`folders`] - production folder layout

pub mod constants;
pub mod export;
pub mod folders;
pub mod markers;

use crate::release::{
    ReleaseJob,
    error::{ErrorExt, Result},
    utils::process::ExternalCommand,
};
use std::path::PathBuf;

/// Log of the dependency installation, under the source log directory.
pub const COMPOSER_LOG: &str = "composer-install.log";
/// Log of the asset build, under the source log directory.
pub const ASSETS_LOG: &str = "build-assets.log";

/// Stages and normalises the source tree of one job.
#[derive(Debug)]
pub struct Stager<'a> {
    job: &'a ReleaseJob,
}

impl<'a> Stager<'a> {
    /// Stager for `job`.
    pub fn new(job: &'a ReleaseJob) -> Self {
        Self { job }
    }

    /// Copies the committed tree into a fresh staging directory.
    pub async fn export_committed(&self) -> Result<()> {
        export::export_committed(
            &self.job.tools().tools.git,
            self.job.source_path(),
            self.job.staging_path(),
            self.job.temp_root(),
            self.job.tools().command_timeout(),
        )
        .await
    }

    /// Rewrites version and debug constants in the staged configuration files.
    pub fn apply_version_constants(&self) -> Result<()> {
        constants::apply_all(self.job.staging_path(), self.job.version())
    }

    /// Writes the aggregated LICENSES file. Returns the number of licences found.
    pub fn generate_licenses(&self) -> Result<usize> {
        markers::write_licenses_file(self.job.staging_path())
    }

    /// Writes CACHEDIR.TAG markers.
    pub fn generate_cache_tags(&self) -> Result<Vec<PathBuf>> {
        markers::write_cachedir_tags(self.job.staging_path())
    }

    fn truncate_log(&self, name: &str) -> Result<PathBuf> {
        let dir = self.job.log_dir();
        std::fs::create_dir_all(&dir).fs_context("creating log directory", &dir)?;
        let path = dir.join(name);
        std::fs::File::create(&path).fs_context("creating command log", &path)?;
        Ok(path)
    }

    /// Commands run by [`Stager::install_dependencies`], in order.
    pub fn dependency_commands(&self) -> Vec<ExternalCommand> {
        let composer = &self.job.tools().tools.composer;
        let timeout = self.job.tools().command_timeout();
        let staging = self.job.staging_path();
        let autoloader_suffix = format!("{:x}", md5::compute(self.job.version().as_str()));

        vec![
            ExternalCommand::new(composer, timeout)
                .args(["config", "autoloader-suffix"])
                .arg(autoloader_suffix)
                .env("SYMFONY_ENV", "prod")
                .current_dir(staging),
            ExternalCommand::new(composer, timeout)
                .args([
                    "install",
                    "--no-dev",
                    "--optimize-autoloader",
                    "--no-interaction",
                ])
                .env("SYMFONY_ENV", "prod")
                .current_dir(staging),
        ]
    }

    /// Installs production dependencies in the staged tree.
    ///
    /// Output of every command goes to `var/logs/composer-install.log` in the
    /// source tree.
    pub async fn install_dependencies(&self) -> Result<PathBuf> {
        let log = self.truncate_log(COMPOSER_LOG)?;
        for command in self.dependency_commands() {
            command.run_logged(&log).await?;
        }
        Ok(log)
    }

    /// Command run by [`Stager::build_assets`].
    pub fn assets_command(&self) -> ExternalCommand {
        ExternalCommand::new(&self.job.tools().tools.make, self.job.tools().command_timeout())
            .arg("assets")
            .current_dir(self.job.staging_path())
    }

    /// Compiles front-end assets in the staged tree.
    pub async fn build_assets(&self) -> Result<PathBuf> {
        let log = self.truncate_log(ASSETS_LOG)?;
        self.assets_command().run_logged(&log).await?;
        Ok(log)
    }

    /// Creates runtime folders and renames development folders.
    pub fn prepare_folders(&self) -> Result<()> {
        folders::prepare_folders(self.job.staging_path())
    }
}
