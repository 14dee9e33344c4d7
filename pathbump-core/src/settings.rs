//! Clap-free settings for the pipeline entry points.

use crate::error::ReleaseError;
use camino::Utf8PathBuf;
use pathbump_types::{Level, PathScheme, PathVersion};

/// Where to operate and how import paths are shaped.
#[derive(Debug, Clone)]
pub struct WorkspaceSettings {
    /// Directory of the package being worked on. Dependents are searched below it.
    pub dir: Utf8PathBuf,
    pub scheme: PathScheme,
    pub path_version: PathVersion,
    /// Compute the rewrite patch without touching files, tags or remotes.
    pub dry_run: bool,
}

impl WorkspaceSettings {
    pub fn new(dir: Utf8PathBuf) -> Self {
        Self {
            dir,
            scheme: PathScheme::default(),
            path_version: PathVersion::default(),
            dry_run: false,
        }
    }
}

/// What a release does after rewriting imports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReleaseMode {
    /// Rewrite imports only.
    #[default]
    RewriteOnly,
    /// Rewrite, tag, push the tags and install the released package.
    Publish,
}

#[derive(Debug, Clone)]
pub struct ReleaseSettings {
    pub level: Level,
    pub mode: ReleaseMode,
}

impl ReleaseSettings {
    pub fn new(level: Level, mode: ReleaseMode) -> Self {
        Self { level, mode }
    }

    /// Parse a `major|minor|patch` step name.
    pub fn from_step(step: &str, mode: ReleaseMode) -> Result<Self, ReleaseError> {
        Ok(Self::new(step.parse()?, mode))
    }

    pub fn publishes(&self) -> bool {
        self.mode == ReleaseMode::Publish
    }
}
