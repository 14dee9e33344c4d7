//! Locating the directory that package identities are relative to.

use anyhow::{Context, bail};
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use std::ffi::OsStr;
use tracing::debug;

pub fn canonical(path: &Utf8Path) -> anyhow::Result<Utf8PathBuf> {
    let resolved = fs::canonicalize(path)?;
    Utf8PathBuf::from_path_buf(resolved)
        .map_err(|p| anyhow::anyhow!("path is not valid UTF-8: {}", p.display()))
}

/// Resolve the source root for the canonical package directory `dir`.
///
/// Order: the explicit root, then the first `$GOPATH` entry whose `src`
/// contains `dir`, then the nearest ancestor of `dir` named `src`.
pub fn resolve(
    dir: &Utf8Path,
    explicit: Option<&Utf8Path>,
    gopath: Option<&OsStr>,
) -> anyhow::Result<Utf8PathBuf> {
    if let Some(root) = explicit {
        return canonical(root).with_context(|| format!("source root {}", root));
    }

    if let Some(gopath) = gopath {
        for entry in std::env::split_paths(gopath) {
            let Ok(entry) = Utf8PathBuf::from_path_buf(entry.join("src")) else {
                continue;
            };
            let Ok(src) = canonical(&entry) else {
                continue;
            };
            if dir.starts_with(&src) {
                debug!(src_root = %src, "source root from GOPATH");
                return Ok(src);
            }
        }
    }

    if let Some(src) = dir.ancestors().find(|a| a.file_name() == Some("src")) {
        debug!(src_root = %src, "source root from ancestor");
        return Ok(src.to_path_buf());
    }

    bail!(
        "cannot determine the source root for {}; pass --src-root or set PATHBUMP_SRC_ROOT",
        dir
    )
}
