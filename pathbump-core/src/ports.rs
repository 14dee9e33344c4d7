//! Port traits abstracting version control and installation away from the pipeline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CreateTagError {
    #[error("tag already exists")]
    AlreadyExists,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Version-control operations, scoped to one repository for one invocation.
pub trait RepositoryClient {
    fn list_tags(&self) -> anyhow::Result<Vec<String>>;
    fn create_tag(&self, name: &str, commit: &str) -> Result<(), CreateTagError>;
    fn push_tags(&self) -> anyhow::Result<()>;
    fn current_commit(&self) -> anyhow::Result<String>;
}

/// Fetch and install a package by its import path.
pub trait Installer {
    fn install(&self, package: &str) -> anyhow::Result<()>;
}
