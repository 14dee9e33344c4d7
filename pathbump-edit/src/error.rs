//! Error types for pathbump-edit.

use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RewriteError {
    /// Reading or writing one file of the job failed. Files before it in the
    /// job have already been written.
    #[error("rewrite {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid rewrite pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type RewriteResult<T> = Result<T, RewriteError>;
