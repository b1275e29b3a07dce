//! Command line argument parsing and validation.
//!
//! This module provides CLI argument parsing using clap, with validation of
//! the options that clap cannot check on its own.

use clap::Parser;
use std::path::PathBuf;

/// PrestaShop release creator
#[derive(Parser, Debug)]
#[command(
    name = "prestashop_release",
    about = "Creates a PrestaShop release from a source tree",
    disable_version_flag = true,
    long_about = "Creates a PrestaShop release from the committed state of a source tree.

Exports the tree to a temporary staging directory, sets the release constants,
installs dependencies, builds assets, removes development files, writes the
checksum manifest and packages everything.

Usage:
  prestashop_release --version 8.1.0
  prestashop_release --source ~/prestashop --no-installer --destination-dir /tmp/release
  prestashop_release --no-zip --keep-tests

Outputs prestashop_<version>.zip (or a prestashop/ directory with --no-zip) and
prestashop_<version>.xml in the destination directory."
)]
pub struct Args {
    /// Source tree (must be a git working copy)
    #[arg(short = 's', long, value_name = "DIR", default_value = ".")]
    pub source: PathBuf,

    /// Release version, read from src/Core/Version.php when omitted
    #[arg(long, value_name = "VERSION")]
    pub version: Option<String>,

    /// Do not wrap the release in the installer bundle
    #[arg(long)]
    pub no_installer: bool,

    /// Do not compress the release (implies --no-installer)
    #[arg(long)]
    pub no_zip: bool,

    /// Destination directory [default: <source>/tools/build/releases/<version>_<timestamp>]
    #[arg(short = 'd', long, value_name = "DIR")]
    pub destination_dir: Option<PathBuf>,

    /// Keep tests, VCS metadata and docker files in the release
    #[arg(long)]
    pub keep_tests: bool,

    /// Directory holding the staging and work directories [default: system temp dir]
    #[arg(long, value_name = "DIR", env = "PRESTASHOP_RELEASE_TMP_DIR")]
    pub temp_dir: Option<PathBuf>,

    /// TOML file overriding external tools and their timeout
    #[arg(short = 'c', long, value_name = "FILE", env = "PRESTASHOP_RELEASE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print stage details
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print fatal errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.version.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Err("Version cannot be empty".to_string());
        }

        if self.source.as_os_str().is_empty() {
            return Err("Source cannot be empty".to_string());
        }

        if let Some(temp_dir) = &self.temp_dir {
            if temp_dir.parent().is_none() {
                return Err(format!(
                    "Temp directory cannot be a filesystem root: {}",
                    temp_dir.display()
                ));
            }
        }

        Ok(())
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for terminal output
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        let output = super::OutputManager::new(args.verbose, args.quiet);
        Self { output }
    }
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build_zip_and_installer() {
        let args = Args::try_parse_from(["prestashop_release"]).unwrap();
        assert_eq!(args.source, PathBuf::from("."));
        assert!(args.version.is_none());
        assert!(!args.no_zip && !args.no_installer && !args.keep_tests);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn version_is_an_option_not_a_flag() {
        let args = Args::try_parse_from(["prestashop_release", "--version", "8.1.0", "--no-zip"])
            .unwrap();
        assert_eq!(args.version.as_deref(), Some("8.1.0"));
        assert!(args.no_zip);
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Args::try_parse_from(["prestashop_release", "-v", "-q"]).is_err());
    }

    #[test]
    fn empty_version_is_rejected() {
        let args = Args::try_parse_from(["prestashop_release", "--version", " "]).unwrap();
        assert!(args.validate().is_err());
    }

    #[test]
    fn root_temp_dir_is_rejected() {
        let args = Args::try_parse_from(["prestashop_release", "--temp-dir", "/"]).unwrap();
        assert!(args.validate().unwrap_err().contains("filesystem root"));
    }
}
