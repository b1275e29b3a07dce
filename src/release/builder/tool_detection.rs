//! External tool availability checking.
//!
//! The pipeline probes its tools before staging so a missing program is
//! reported up front instead of after a long dependency install.

use crate::release::{ReleaseJob, Result, error::Error};
use std::path::PathBuf;

/// Resolves `program` through `PATH` (or as a path), logging the outcome.
pub fn detect_tool(program: &str) -> Option<PathBuf> {
    match which::which(program) {
        Ok(path) => {
            log::debug!("Found {} at: {}", program, path.display());
            Some(path)
        }
        Err(e) => {
            log::debug!("{} not found in PATH: {}", program, e);
            None
        }
    }
}

/// Programs the job will invoke, in pipeline order.
pub fn required_tools(job: &ReleaseJob) -> Vec<&str> {
    let tools = &job.tools().tools;
    let mut required = vec![tools.git.as_str(), tools.composer.as_str(), tools.make.as_str()];
    if job.use_installer() {
        required.push(tools.php.as_str());
    }
    required
}

/// Fails with a spawn error naming the first program that cannot be found.
pub fn ensure_tools(job: &ReleaseJob) -> Result<()> {
    for program in required_tools(job) {
        if detect_tool(program).is_none() {
            return Err(Error::CommandSpawn {
                command: program.to_string(),
                error: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("`{program}` is not installed or not in PATH"),
                ),
            });
        }
    }
    Ok(())
}
