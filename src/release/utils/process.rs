//! Structured invocation of external commands.
//!
//! Commands are built from an explicit argument list and never go through a
//! shell. Output is either captured in memory or streamed verbatim to a log
//! file, and every run is bounded by a timeout.

use crate::release::error::{Error, ErrorExt, Result};
use std::{
    ffi::{OsStr, OsString},
    fmt,
    path::{Path, PathBuf},
    process::{Output, Stdio},
    time::Duration,
};

/// A single external command.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    envs: Vec<(OsString, OsString)>,
    timeout: Duration,
}

impl ExternalCommand {
    /// New command for `program` with the given timeout.
    pub fn new(program: impl AsRef<OsStr>, timeout: Duration) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            cwd: None,
            envs: Vec::new(),
            timeout,
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Working directory.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Environment variable for the child.
    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.envs
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    fn to_tokio(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args).kill_on_drop(true).stdin(Stdio::null());
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        for (k, v) in &self.envs {
            cmd.env(k, v);
        }
        cmd
    }

    /// Runs the command, capturing stdout and stderr in memory.
    ///
    /// A non-zero exit status is an error.
    pub async fn output(&self) -> Result<Output> {
        let command = self.to_string();
        log::debug!("running `{command}`");

        let child = self
            .to_tokio()
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| Error::CommandSpawn {
                command: command.clone(),
                error,
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| Error::CommandTimeout {
                command: command.clone(),
                timeout: self.timeout,
            })?
            .map_err(|error| Error::CommandSpawn {
                command: command.clone(),
                error,
            })?;

        if !output.status.success() {
            log::debug!(
                "`{command}` stderr: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Err(Error::CommandFailed {
                command,
                code: output.status.code(),
                log: None,
            });
        }

        Ok(output)
    }

    /// Runs the command with stdout and stderr both appended to `log_path`.
    ///
    /// The log file is kept on failure for diagnosis.
    pub async fn run_logged(&self, log_path: &Path) -> Result<()> {
        let command = self.to_string();
        log::debug!("running `{command}` (log: {})", log_path.display());

        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent).fs_context("creating log directory", parent)?;
        }
        let stdout = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .fs_context("opening command log", log_path)?;
        let stderr = stdout.try_clone().fs_context("opening command log", log_path)?;

        let mut child = self
            .to_tokio()
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|error| Error::CommandSpawn {
                command: command.clone(),
                error,
            })?;

        let waited = tokio::time::timeout(self.timeout, child.wait()).await;
        let status = match waited {
            Ok(status) => status.map_err(|error| Error::CommandSpawn {
                command: command.clone(),
                error,
            })?,
            Err(_) => {
                if let Err(e) = child.kill().await {
                    log::warn!("failed to kill `{command}` after timeout: {e}");
                }
                return Err(Error::CommandTimeout {
                    command,
                    timeout: self.timeout,
                });
            }
        };

        if !status.success() {
            return Err(Error::CommandFailed {
                command,
                code: status.code(),
                log: Some(log_path.to_path_buf()),
            });
        }

        Ok(())
    }
}

impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}
