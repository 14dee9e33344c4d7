use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while parsing or selecting versions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("invalid version format: {input:?}")]
    InvalidVersionFormat { input: String },

    #[error("no versions available")]
    NoVersionsAvailable,

    #[error("invalid level: {input:?} (expected major, minor or patch)")]
    InvalidLevel { input: String },

    #[error("cannot bump {version} at {level} level: component overflows")]
    Overflow { version: Version, level: Level },
}

/// A three component version tuple.
///
/// Field order matters: the derived `Ord` is the lexicographic order on
/// (major, minor, patch).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse strings like `v1`, `v2.3` or `v4.0.3`.
    ///
    /// Components beyond the third are ignored. Any component that is not a
    /// non-negative integer rejects the whole string.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let invalid = || VersionError::InvalidVersionFormat {
            input: input.to_string(),
        };

        let rest = input.strip_prefix('v').ok_or_else(invalid)?;
        if rest.is_empty() {
            return Err(invalid());
        }

        let mut parts = [0u64; 3];
        for (slot, token) in parts.iter_mut().zip(rest.split('.')) {
            if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            *slot = token.parse().map_err(|_| invalid())?;
        }

        Ok(Self::new(parts[0], parts[1], parts[2]))
    }

    /// Next version at the given level.
    pub fn bump(self, level: Level) -> Result<Self, VersionError> {
        let overflow = || VersionError::Overflow {
            version: self,
            level,
        };
        Ok(match level {
            Level::Major => Self::new(self.major.checked_add(1).ok_or_else(overflow)?, 0, 0),
            Level::Minor => Self::new(
                self.major,
                self.minor.checked_add(1).ok_or_else(overflow)?,
                0,
            ),
            Level::Patch => Self::new(
                self.major,
                self.minor,
                self.patch.checked_add(1).ok_or_else(overflow)?,
            ),
        })
    }

    /// The version with minor and patch cleared.
    pub fn major_only(self) -> Self {
        Self::new(self.major, 0, 0)
    }
}

impl fmt::Display for Version {
    /// Canonical form: `v2` for (2,0,0), `v2.4` for (2,4,0), `v2.0.1` for (2,0,1).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.major)?;
        if self.minor != 0 || self.patch != 0 {
            write!(f, ".{}", self.minor)?;
        }
        if self.patch != 0 {
            write!(f, ".{}", self.patch)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Which component of a version a release increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Major,
    Minor,
    Patch,
}

impl FromStr for Level {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "major" => Ok(Level::Major),
            "minor" => Ok(Level::Minor),
            "patch" => Ok(Level::Patch),
            other => Err(VersionError::InvalidLevel {
                input: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Major => "major",
            Level::Minor => "minor",
            Level::Patch => "patch",
        })
    }
}

/// The greatest version of a non-empty list.
pub fn latest(versions: &[Version]) -> Result<Version, VersionError> {
    versions
        .iter()
        .copied()
        .max()
        .ok_or(VersionError::NoVersionsAvailable)
}

/// The greatest version among repository tags.
///
/// Tags that do not parse as versions are skipped, so a stray tag never
/// blocks a release.
pub fn latest_from_tags<S: AsRef<str>>(tags: &[S]) -> Result<Version, VersionError> {
    let versions: Vec<Version> = tags
        .iter()
        .filter_map(|t| Version::parse(t.as_ref()).ok())
        .collect();
    latest(&versions)
}
