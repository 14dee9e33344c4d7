use crate::version::{Version, VersionError};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Slash separated import path naming a package, e.g. `github.com/org/repo/sub`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageIdentity(String);

impl PackageIdentity {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when `other` is this identity or one of its sub-packages.
    pub fn contains(&self, other: &str) -> bool {
        match other.strip_prefix(self.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PackageIdentity {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PackageIdentity {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for PackageIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("not a versionable path: {path:?} (expected {expected}/...)")]
    NotAVersionablePath { path: String, expected: String },

    #[error("bad version in path {path:?}: {source}")]
    Version {
        path: String,
        #[source]
        source: VersionError,
    },
}

/// How much of a version is embedded in a versioned import path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathVersion {
    /// `gopkg.in/a/b.v2` for every 2.x.y release.
    #[default]
    Major,
    /// `gopkg.in/a/b.v2.3.1`.
    Full,
}

impl PathVersion {
    pub fn apply(self, version: Version) -> Version {
        match self {
            PathVersion::Major => version.major_only(),
            PathVersion::Full => version,
        }
    }
}

/// The pair of host prefixes that map an unversioned identity onto its
/// versioned form.
///
/// `github.com/a/b` (hosting) corresponds to the family `gopkg.in/a/b.vN`
/// (versioned).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathScheme {
    pub hosting: String,
    pub versioned: String,
}

impl Default for PathScheme {
    fn default() -> Self {
        Self {
            hosting: "github.com".to_string(),
            versioned: "gopkg.in".to_string(),
        }
    }
}

impl PathScheme {
    pub fn new(hosting: impl Into<String>, versioned: impl Into<String>) -> Self {
        Self {
            hosting: hosting.into(),
            versioned: versioned.into(),
        }
    }

    pub fn is_versioned(&self, path: &str) -> bool {
        split_host(path).is_some_and(|(host, _)| host == self.versioned)
    }

    /// Versioned family prefix without a version: `github.com/a/b` -> `gopkg.in/a/b`.
    pub fn bare_versioned(&self, identity: &PackageIdentity) -> Result<String, PathError> {
        let rest = self.hosting_rest(identity.as_str())?;
        Ok(format!("{}/{}", self.versioned, rest))
    }

    /// `github.com/a/b` + (1,2,0) -> `gopkg.in/a/b.v1.2`.
    pub fn versioned_path(
        &self,
        identity: &PackageIdentity,
        version: Version,
    ) -> Result<String, PathError> {
        Ok(format!("{}.{}", self.bare_versioned(identity)?, version))
    }

    /// Inverse of [`PathScheme::versioned_path`]: `gopkg.in/a/b.v1.2` -> `github.com/a/b`.
    ///
    /// Anything after the version suffix is dropped.
    pub fn hosting_path(&self, path: &str) -> Result<PackageIdentity, PathError> {
        let (start, _) = self.version_span(path)?;
        let rest = &path[self.versioned.len() + 1..start];
        Ok(PackageIdentity::new(format!("{}/{}", self.hosting, rest)))
    }

    /// Version embedded in a versioned path, e.g. `gopkg.in/a/b.v1.2/sql` -> (1,2,0).
    pub fn version_of(&self, path: &str) -> Result<Version, PathError> {
        let (start, stop) = self.version_span(path)?;
        Version::parse(&path[start + 1..stop]).map_err(|source| PathError::Version {
            path: path.to_string(),
            source,
        })
    }

    fn hosting_rest<'a>(&self, path: &'a str) -> Result<&'a str, PathError> {
        match split_host(path) {
            Some((host, rest)) if host == self.hosting && !rest.is_empty() => Ok(rest),
            _ => Err(PathError::NotAVersionablePath {
                path: path.to_string(),
                expected: self.hosting.clone(),
            }),
        }
    }

    /// Byte range of `.vX.Y.Z` within a versioned path: (index of the dot,
    /// end of the version text).
    fn version_span(&self, path: &str) -> Result<(usize, usize), PathError> {
        let not_versioned = || PathError::NotAVersionablePath {
            path: path.to_string(),
            expected: self.versioned.clone(),
        };
        if !self.is_versioned(path) {
            return Err(not_versioned());
        }
        let start = path.rfind(".v").ok_or_else(not_versioned)?;
        if start <= self.versioned.len() + 1 {
            return Err(not_versioned());
        }
        let stop = path[start..]
            .find('/')
            .map(|i| start + i)
            .unwrap_or(path.len());
        Ok((start, stop))
    }
}

fn split_host(path: &str) -> Option<(&str, &str)> {
    match path.split_once('/') {
        Some(("", _)) | None => None,
        Some(pair) => Some(pair),
    }
}
