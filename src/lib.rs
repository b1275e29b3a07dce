//! Release packaging library for PrestaShop source trees.
//!
//! This library turns a committed source tree into a distributable release:
//! - a production-ready staged copy (constants, licences, dependencies, assets)
//! - a pruned tree without development files
//! - an MD5 checksum manifest of every shipped file
//! - a zip archive, optionally wrapped in the self-extracting installer bundle
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod cli;
pub mod error;
pub mod metadata;
pub mod release;

// Re-export commonly used types
pub use error::{CliError, ReleaseError, Result};
