//! Command line interface for the release creator.
//!
//! Parses arguments, builds the [`ReleaseJob`](crate::release::ReleaseJob)
//! and runs the [`Packager`], narrating progress and the final diagnostic.

mod args;
mod output;

pub use args::{Args, RuntimeConfig};
pub use output::OutputManager;

use crate::{
    error::{CliError, Result},
    metadata,
    release::{Packager, ReleaseArtifact, ReleaseJobBuilder},
};
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    let config = RuntimeConfig::from(&args);
    Ok(execute(&args, config.output()).await)
}

/// Runs a release for `args` and returns the process exit code.
///
/// Failures are reported on `output` as a fatal line followed by hints.
pub async fn execute(args: &Args, output: &OutputManager) -> i32 {
    match release(args, output).await {
        Ok(_) => 0,
        Err(e) => {
            output.error(&e.to_string());
            for suggestion in e.recovery_suggestions() {
                output.indent(&suggestion);
            }
            1
        }
    }
}

async fn release(args: &Args, output: &OutputManager) -> Result<ReleaseArtifact> {
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    let source = absolute(&args.source)?;
    if !source.is_dir() {
        return Err(CliError::SourceNotFound { path: source }.into());
    }

    let config_path = args.config.as_deref().map(absolute).transpose()?;
    let tools = metadata::load_tool_config(config_path.as_deref())?;

    if args.no_zip && !args.no_installer {
        output.warn("--no-zip given, the installer bundle will not be built");
    }

    let mut builder = ReleaseJobBuilder::new()
        .source_path(&source)
        .use_zip(!args.no_zip)
        .use_installer(!args.no_installer)
        .keep_tests(args.keep_tests)
        .tools(tools);
    if let Some(version) = &args.version {
        builder = builder.version(version.trim());
    }
    if let Some(destination) = &args.destination_dir {
        builder = builder.destination_path(absolute(destination)?);
    }
    if let Some(temp_dir) = &args.temp_dir {
        builder = builder.temp_root(absolute(temp_dir)?);
    }
    let job = builder.build()?;

    output.verbose(&format!("source: {}", job.source_path().display()));
    output.verbose(&format!("staging: {}", job.staging_path().display()));
    output.verbose(&format!("destination: {}", job.destination_path().display()));

    let artifact = Packager::new(job, output.clone()).package().await?;
    Ok(artifact)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(path.absolutize()?.into_owned())
}
