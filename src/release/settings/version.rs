//! Release version parsing.

use std::fmt;

use crate::release::{Error, Result};

/// Parsed release version.
///
/// Legacy `1.X.Y.Z` versions carry the major version in their first two
/// components (`1.7.3.4` has major `17`, major string `1.7`); modern versions
/// are plain `X.Y.Z`.
///
/// # Examples
///
/// ```
/// use prestashop_release::release::VersionSpec;
///
/// let v = VersionSpec::parse("1.7.3.4").unwrap();
/// assert_eq!(v.major(), 17);
/// assert_eq!(v.major_version_string(), "1.7");
/// assert_eq!(v.minor(), 3);
/// assert_eq!(v.release(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSpec {
    major: u32,
    minor: u32,
    release: u32,
    major_string: String,
    raw: String,
}

impl VersionSpec {
    /// Parse a dotted version string.
    ///
    /// Anything after a `-` or `+` is kept in the raw string but ignored for
    /// the numeric fields.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::Configuration("version string is empty".into()));
        }

        let core = raw.split(['-', '+']).next().unwrap_or(raw);
        let parts = core
            .split('.')
            .map(|p| {
                p.parse::<u32>().map_err(|_| {
                    Error::Configuration(format!(
                        "invalid version `{raw}`: `{p}` is not a number"
                    ))
                })
            })
            .collect::<Result<Vec<u32>>>()?;

        let spec = match parts.as_slice() {
            [1, x, minor, release, ..] => Self {
                major: format!("1{x}").parse().map_err(|_| {
                    Error::Configuration(format!("invalid legacy version `{raw}`"))
                })?,
                minor: *minor,
                release: *release,
                major_string: format!("1.{x}"),
                raw: raw.to_string(),
            },
            [1, ..] => {
                return Err(Error::Configuration(format!(
                    "invalid version `{raw}`: legacy versions need four components"
                )));
            }
            [major, minor, release, ..] => Self {
                major: *major,
                minor: *minor,
                release: *release,
                major_string: major.to_string(),
                raw: raw.to_string(),
            },
            _ => {
                return Err(Error::Configuration(format!(
                    "invalid version `{raw}`: expected at least three components"
                )));
            }
        };

        Ok(spec)
    }

    /// Major version (`17` for `1.7.3.4`, `8` for `8.1.0`).
    pub fn major(&self) -> u32 {
        self.major
    }

    /// Minor version.
    pub fn minor(&self) -> u32 {
        self.minor
    }

    /// Release (patch) version.
    pub fn release(&self) -> u32 {
        self.release
    }

    /// Major version as written in the kernel (`1.7` or `8`).
    pub fn major_version_string(&self) -> &str {
        &self.major_string
    }

    /// The version exactly as given.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Base name of the release artifacts, e.g. `prestashop_8.1.0`.
    pub fn artifact_stem(&self) -> String {
        format!("prestashop_{}", self.raw)
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modern_version() {
        let v = VersionSpec::parse("8.1.2").unwrap();
        assert_eq!((v.major(), v.minor(), v.release()), (8, 1, 2));
        assert_eq!(v.major_version_string(), "8");
        assert_eq!(v.artifact_stem(), "prestashop_8.1.2");
    }

    #[test]
    fn prerelease_suffix_is_kept_raw() {
        let v = VersionSpec::parse("9.0.0-beta.1").unwrap();
        assert_eq!(v.release(), 0);
        assert_eq!(v.as_str(), "9.0.0-beta.1");
        assert_eq!(v.to_string(), "9.0.0-beta.1");
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "abc", "8.1", "1.7.3", "8.x.0"] {
            let err = VersionSpec::parse(bad).unwrap_err();
            assert_eq!(err.kind(), crate::release::ErrorKind::Configuration, "{bad}");
        }
    }
}
