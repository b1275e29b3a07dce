//! Main packager orchestration.
//!
//! This module provides the [`Packager`] that runs every stage of a release
//! job in order and turns the staged tree into the final deliverable.

use std::{
    future::Future,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local};
use tempfile::TempDir;

use crate::{
    cli::OutputManager,
    release::{
        ReleaseJob, STAGING_DIR_NAME,
        cleanup::{TreeNode, prune, snapshot},
        error::{Error, ErrorExt, Result},
        stager::Stager,
        utils::{
            blocking,
            fs::{create_dir_all, disk_usage, ensure_vacant, human_size, move_path, remove_guarded},
            process::ExternalCommand,
        },
    },
};

use super::{
    ArchiveOutput, ArtifactKind, Stage,
    archive::{INSTALLER_ZIP_FILENAME, zip_directory, zip_files},
    checksum::{ManifestHandoff, calculate_sha256, write_manifest},
    tool_detection::ensure_tools,
};

/// Installer unpacker sources, relative to the source tree.
pub const INSTALL_UNPACKER_DIR: &str = "tools/build/Library/InstallUnpacker";
/// Documentation shipped at the root of the installer bundle.
pub const INSTALLER_DOCS_DIR: &str = "tools/build/doc";
/// Entry point generated by the unpacker compiler.
pub const INSTALLER_ENTRY_POINT: &str = "index.php";

/// Result of a successful job.
#[derive(Debug, Clone)]
pub struct ReleaseArtifact {
    /// Deliverable kind.
    pub kind: ArtifactKind,
    /// Deliverable path in the destination directory.
    pub path: PathBuf,
    /// Checksum manifest path in the destination directory.
    pub manifest: PathBuf,
    /// Number of files and symlinks listed in the manifest.
    pub manifest_entries: usize,
    /// Size in bytes (whole tree for directory releases).
    pub size: u64,
    /// SHA-256 of the archive, `None` for directory releases.
    pub checksum: Option<String>,
    /// When the job started.
    pub started_at: DateTime<Local>,
    /// When the job finished.
    pub finished_at: DateTime<Local>,
}

impl ReleaseArtifact {
    /// Size as `du -h` prints it.
    pub fn human_size(&self) -> String {
        human_size(self.size)
    }
}

/// Release packager.
///
/// Owns one [`ReleaseJob`] and runs its stages strictly in sequence. The first
/// failing stage ends the job; the staging directory is removed whatever the
/// outcome.
///
/// # Examples
///
/// ```no_run
/// use prestashop_release::cli::OutputManager;
/// use prestashop_release::release::{Packager, ReleaseJob};
///
/// # async fn example(job: ReleaseJob) -> prestashop_release::release::Result<()> {
/// let artifact = Packager::new(job, OutputManager::new(false, false))
///     .package()
///     .await?;
/// println!("SHA256: {:?}", artifact.checksum);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Packager {
    job: ReleaseJob,
    output: OutputManager,
}

impl Packager {
    /// Creates a packager narrating to `output`.
    pub fn new(job: ReleaseJob, output: OutputManager) -> Self {
        Self { job, output }
    }

    /// Returns the job being packaged.
    pub fn job(&self) -> &ReleaseJob {
        &self.job
    }

    /// Runs the whole pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StageFailed`] naming the first stage that failed.
    pub async fn package(&self) -> Result<ReleaseArtifact> {
        let started_at = Local::now();
        self.output.section(&format!(
            "Packaging PrestaShop {} (started at {})",
            self.job.version(),
            started_at.format("%H:%M:%S")
        ));
        log::info!(
            "release {}: zip={} installer={} keep_tests={}",
            self.job.version(),
            self.job.use_zip(),
            self.job.use_installer(),
            self.job.keep_tests()
        );

        let mut completed = Vec::new();
        let outcome = self.run(started_at, &mut completed).await;

        match outcome {
            Ok(artifact) => {
                self.report(&artifact);
                Ok(artifact)
            }
            Err(error) => {
                if let Err(cleanup) = self.remove_staging() {
                    self.output.warn(&format!("staging directory was not removed: {cleanup}"));
                }
                if !completed.is_empty() {
                    let done: Vec<String> = completed.iter().map(ToString::to_string).collect();
                    self.output.indent(&format!("completed stages: {}", done.join(", ")));
                }
                self.output.indent(&format!(
                    "command logs are kept in {}",
                    self.job.log_dir().display()
                ));
                Err(error)
            }
        }
    }

    async fn run(
        &self,
        started_at: DateTime<Local>,
        completed: &mut Vec<Stage>,
    ) -> Result<ReleaseArtifact> {
        let stager = Stager::new(&self.job);

        let work_dir = self.step(Stage::Init, completed, async { self.init() }).await?;

        self.step(Stage::Stage, completed, stager.export_committed()).await?;
        self.step(Stage::ApplyVersionConstants, completed, async {
            stager.apply_version_constants()
        })
        .await?;
        self.step(Stage::GenerateLicenses, completed, async {
            let count = stager.generate_licenses()?;
            self.output.verbose(&format!("{count} licence files aggregated"));
            Ok::<_, Error>(())
        })
        .await?;
        self.step(Stage::GenerateCacheTags, completed, async {
            stager.generate_cache_tags().map(drop)
        })
        .await?;
        self.step(Stage::InstallDependencies, completed, stager.install_dependencies())
            .await?;
        self.step(Stage::BuildAssets, completed, stager.build_assets()).await?;

        let tree = self.step(Stage::Clean, completed, self.clean(&stager)).await?;
        let manifest = self
            .step(
                Stage::GenerateManifest,
                completed,
                self.generate_manifest(tree, work_dir.path()),
            )
            .await?;
        let archive = self
            .step(Stage::Archive, completed, self.archive(work_dir.path()))
            .await?;
        let (path, manifest_path) = self
            .step(Stage::Move, completed, self.move_release(&archive, &manifest))
            .await?;

        self.step(Stage::Done, completed, async {
            let (size, checksum) = measure(archive.kind, &path).await?;
            Ok::<_, Error>(ReleaseArtifact {
                kind: archive.kind,
                path: path.clone(),
                manifest: manifest_path.clone(),
                manifest_entries: manifest.entries,
                size,
                checksum,
                started_at,
                finished_at: Local::now(),
            })
        })
        .await
    }

    async fn step<T>(
        &self,
        stage: Stage,
        completed: &mut Vec<Stage>,
        work: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        self.output.progress(&format!("{}...", stage.description()));
        log::info!("stage {stage} started");

        match work.await {
            Ok(value) => {
                log::info!("stage {stage} finished");
                completed.push(stage);
                Ok(value)
            }
            Err(error) => {
                log::error!("stage {stage} failed: {error}");
                Err(Error::StageFailed {
                    stage,
                    source: Box::new(error),
                })
            }
        }
    }

    fn init(&self) -> Result<TempDir> {
        ensure_tools(&self.job)?;
        create_dir_all(self.job.temp_root())?;
        create_dir_all(self.job.destination_path())?;

        let work_dir = tempfile::Builder::new()
            .prefix("prestashop-release-")
            .tempdir_in(self.job.temp_root())
            .fs_context("creating work directory in", self.job.temp_root())?;
        log::debug!("work directory: {}", work_dir.path().display());
        Ok(work_dir)
    }

    async fn clean(&self, stager: &Stager<'_>) -> Result<TreeNode> {
        stager.prepare_folders()?;

        let rules = self.job.exclusion_rules().clone();
        let staging = self.job.staging_path().to_path_buf();
        let guard_root = self.job.temp_root().to_path_buf();

        let (tree, removed) = blocking("release tree cleanup", move || {
            let mut tree = snapshot(&staging)?;
            let removed = prune(&mut tree, &staging, &rules, &guard_root)?;
            Ok((tree, removed))
        })
        .await?;

        self.output
            .verbose(&format!("{} excluded entries removed", removed.len()));
        Ok(tree)
    }

    async fn generate_manifest(&self, tree: TreeNode, work_dir: &Path) -> Result<ManifestHandoff> {
        let path = work_dir.join(self.job.manifest_file_name());
        let staging = self.job.staging_path().to_path_buf();
        let version = self.job.version().clone();

        let handoff = blocking("checksum manifest", move || {
            write_manifest(&tree, &staging, &version, &path)
        })
        .await?;

        self.output
            .verbose(&format!("{} entries written to the manifest", handoff.entries));
        Ok(handoff)
    }

    async fn archive(&self, work_dir: &Path) -> Result<ArchiveOutput> {
        let staging = self.job.staging_path().to_path_buf();
        if !self.job.use_zip() {
            self.output.verbose("zip disabled, releasing the staged directory");
            return Ok(ArchiveOutput {
                kind: ArtifactKind::Directory,
                path: staging,
            });
        }

        let target = work_dir.join(self.job.archive_file_name());
        if !self.job.use_installer() {
            let archive = target.clone();
            blocking("release archive", move || zip_directory(&staging, &archive)).await?;
            return Ok(ArchiveOutput {
                kind: ArtifactKind::Zip,
                path: target,
            });
        }

        let payload = work_dir.join(INSTALLER_ZIP_FILENAME);
        let payload_target = payload.clone();
        blocking("release payload", move || zip_directory(&staging, &payload_target)).await?;

        let docs = installer_docs(&self.job.source_path().join(INSTALLER_DOCS_DIR))?;
        let unpacker_dir = self.job.source_path().join(INSTALL_UNPACKER_DIR);
        let entry_point = unpacker_dir.join(INSTALLER_ENTRY_POINT);

        // The compiled unpacker lands in the source tree and must not outlive this stage.
        let bundled = async {
            ExternalCommand::new(&self.job.tools().tools.php, self.job.tools().command_timeout())
                .arg("compile.php")
                .arg(self.job.version().as_str())
                .current_dir(&unpacker_dir)
                .output()
                .await?;

            let mut entries = vec![
                (INSTALLER_ZIP_FILENAME.to_string(), payload),
                (INSTALLER_ENTRY_POINT.to_string(), entry_point.clone()),
            ];
            entries.extend(docs);
            let archive = target.clone();
            blocking("installer bundle", move || zip_files(&entries, &archive)).await
        }
        .await;
        let removed = remove_generated(&entry_point);
        bundled?;
        removed?;

        Ok(ArchiveOutput {
            kind: ArtifactKind::InstallerBundle,
            path: target,
        })
    }

    async fn move_release(
        &self,
        archive: &ArchiveOutput,
        manifest: &ManifestHandoff,
    ) -> Result<(PathBuf, PathBuf)> {
        let destination = self.job.destination_path();
        let target = match archive.kind {
            ArtifactKind::Directory => destination.join(STAGING_DIR_NAME),
            ArtifactKind::Zip | ArtifactKind::InstallerBundle => {
                destination.join(self.job.archive_file_name())
            }
        };
        let manifest_target = destination.join(self.job.manifest_file_name());

        let moves = vec![
            (archive.path.clone(), target.clone()),
            (manifest.path.clone(), manifest_target.clone()),
        ];
        for (_, to) in &moves {
            ensure_vacant(to)?;
        }
        let guard_root = self.job.temp_root().to_path_buf();
        blocking("release move", move || {
            for (from, to) in &moves {
                move_path(from, to, &guard_root)?;
            }
            Ok(())
        })
        .await?;

        self.remove_staging()?;
        Ok((target, manifest_target))
    }

    fn remove_staging(&self) -> Result<()> {
        let staging = self.job.staging_path();
        if std::fs::symlink_metadata(staging).is_ok() {
            log::debug!("removing staging directory {}", staging.display());
            remove_guarded(staging, self.job.temp_root())?;
        }
        Ok(())
    }

    fn report(&self, artifact: &ReleaseArtifact) {
        self.output.success(&format!(
            "Release {} created: {}",
            self.job.version(),
            artifact.path.display()
        ));
        self.output
            .indent(&format!("kind: {}", artifact.kind));
        self.output
            .indent(&format!("manifest: {}", artifact.manifest.display()));
        self.output
            .indent(&format!("size: {}", artifact.human_size()));
        if let Some(checksum) = &artifact.checksum {
            self.output.indent(&format!("sha256: {checksum}"));
        }
        self.output.indent(&format!(
            "started at {}, ended at {}",
            artifact.started_at.format("%H:%M:%S"),
            artifact.finished_at.format("%H:%M:%S")
        ));
    }
}

/// Size in bytes and, for archives, the SHA-256 of the delivered artifact.
async fn measure(kind: ArtifactKind, path: &Path) -> Result<(u64, Option<String>)> {
    match kind {
        ArtifactKind::Directory => {
            let root = path.to_path_buf();
            Ok((blocking("release size", move || disk_usage(&root)).await?, None))
        }
        ArtifactKind::Zip | ArtifactKind::InstallerBundle => {
            let size = std::fs::metadata(path)
                .fs_context("reading artifact metadata", path)?
                .len();
            Ok((size, Some(calculate_sha256(path).await?)))
        }
    }
}

fn remove_generated(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Err(error) if error.kind() != std::io::ErrorKind::NotFound => {
            Err(error).fs_context("removing generated unpacker", path)
        }
        _ => Ok(()),
    }
}

/// Regular files of the installer documentation directory, named by basename.
fn installer_docs(docs_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let pattern = format!(
        "{}/*",
        glob::Pattern::escape(&docs_dir.to_string_lossy())
    );

    let mut docs = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = entry.map_err(|e| Error::Fs {
            context: "reading installer documentation".into(),
            path: e.path().to_path_buf(),
            error: e.into_error(),
        })?;
        if !path.is_file() {
            continue;
        }
        if let Some(name) = path.file_name() {
            docs.push((name.to_string_lossy().into_owned(), path.clone()));
        }
    }
    Ok(docs)
}
