//! Error type for pipeline results.

use pathbump_domain::InspectError;
use pathbump_edit::RewriteError;
use pathbump_types::{PathError, VersionError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error(transparent)]
    Inspect(#[from] InspectError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error("tag {tag} already exists")]
    TagAlreadyExists { tag: String },

    #[error("repository error: {0:#}")]
    Repository(anyhow::Error),

    /// The tag stays in place when installation fails.
    #[error("tag {tag} created, but installing {package} failed: {source:#}")]
    Install {
        tag: String,
        package: String,
        source: anyhow::Error,
    },
}

impl ReleaseError {
    pub fn repository(err: anyhow::Error) -> Self {
        ReleaseError::Repository(err)
    }
}
