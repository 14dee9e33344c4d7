//! Rewrite engine for import path literals.
//!
//! Responsibilities:
//! - Compile structural substitutions anchored at a `"` boundary.
//! - Rewrite a set of files in place (or not at all, for a dry run).
//! - Generate a unified diff preview of every change.
//!
//! Content is handled as raw bytes; everything outside a matched span is
//! written back untouched.

mod error;

pub use error::{RewriteError, RewriteResult};

use camino::{Utf8Path, Utf8PathBuf};
use diffy::PatchFormatter;
use fs_err as fs;
use regex::bytes::{Captures, Regex};
use std::borrow::Cow;
use tracing::{debug, info};

/// One substitution applied to file contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteRule {
    /// `"<bare>.v1[.2[.3]]` followed by `"` or `/` becomes `"<target>` plus
    /// that boundary, so trailing segments such as `/sub"` are kept.
    /// `"<bare>.v1beta"` and longer version tails are left alone.
    VersionedFamily { bare: String, target: String },
    /// `"<path>"` or `"<path>/...` becomes `"<target>"` or `"<target>/...`.
    /// A longer segment such as `"<path>x` is left alone.
    BarePath { path: String, target: String },
    /// The exact literal `"<import>"` becomes `"<target>"`.
    ExactImport { import: String, target: String },
}

impl RewriteRule {
    pub fn versioned_family(bare: impl Into<String>, target: impl Into<String>) -> Self {
        RewriteRule::VersionedFamily {
            bare: bare.into(),
            target: target.into(),
        }
    }

    pub fn bare_path(path: impl Into<String>, target: impl Into<String>) -> Self {
        RewriteRule::BarePath {
            path: path.into(),
            target: target.into(),
        }
    }

    pub fn exact_import(import: impl Into<String>, target: impl Into<String>) -> Self {
        RewriteRule::ExactImport {
            import: import.into(),
            target: target.into(),
        }
    }

    pub fn compile(&self) -> RewriteResult<CompiledRule> {
        let (pattern, target) = match self {
            RewriteRule::VersionedFamily { bare, target } => (
                format!(
                    r#""{}[0-9]+(?:\.[0-9]+){{0,2}}(["/])"#,
                    regex::escape(&format!("{bare}.v"))
                ),
                target,
            ),
            RewriteRule::BarePath { path, target } => {
                (format!(r#""{}(["/])"#, regex::escape(path)), target)
            }
            RewriteRule::ExactImport { import, target } => {
                (format!(r#""{}(")"#, regex::escape(import)), target)
            }
        };
        Ok(CompiledRule {
            re: Regex::new(&pattern)?,
            target: target.as_bytes().to_vec(),
        })
    }
}

/// A rule ready to run against file contents.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    re: Regex,
    target: Vec<u8>,
}

impl CompiledRule {
    /// Replaces every match; the boundary group is re-emitted.
    pub fn apply<'a>(&self, content: &'a [u8]) -> Cow<'a, [u8]> {
        self.re.replace_all(content, |caps: &Captures<'_>| {
            let mut out = Vec::with_capacity(self.target.len() + 2);
            out.push(b'"');
            out.extend_from_slice(&self.target);
            if let Some(boundary) = caps.get(1) {
                out.extend_from_slice(boundary.as_bytes());
            }
            out
        })
    }
}

pub fn compile_rules(rules: &[RewriteRule]) -> RewriteResult<Vec<CompiledRule>> {
    rules.iter().map(RewriteRule::compile).collect()
}

/// Apply `rules` in order to `content`.
pub fn rewrite_content(content: &[u8], rules: &[CompiledRule]) -> Vec<u8> {
    let mut current = content.to_vec();
    for rule in rules {
        let next = match rule.apply(&current) {
            Cow::Borrowed(_) => continue,
            Cow::Owned(next) => next,
        };
        current = next;
    }
    current
}

#[derive(Debug, Clone, Default)]
pub struct RewriteOptions {
    /// Compute the patch without touching any file.
    pub dry_run: bool,
}

/// Contents of a file before and after its rules ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub before: Vec<u8>,
    pub after: Vec<u8>,
}

/// Rewrite one file. Returns `None` when no rule changed it.
///
/// The file is written only when its content changed and `opts.dry_run` is
/// unset.
pub fn rewrite_file(
    path: &Utf8Path,
    rules: &[CompiledRule],
    opts: &RewriteOptions,
) -> RewriteResult<Option<FileChange>> {
    let before = read(path)?;
    let after = rewrite_content(&before, rules);
    if before == after {
        debug!(path = %path, "unchanged");
        return Ok(None);
    }
    if !opts.dry_run {
        write(path, &after)?;
        info!(path = %path, "rewrote imports");
    }
    Ok(Some(FileChange { before, after }))
}

/// Rules plus the files they run against. Built per invocation, never stored.
#[derive(Debug, Clone, Default)]
pub struct RewriteJob {
    pub rules: Vec<RewriteRule>,
    pub files: Vec<Utf8PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct RewriteOutcome {
    pub files_scanned: usize,
    pub files_changed: Vec<Utf8PathBuf>,
    /// Unified diff of all changes, written or not.
    pub patch: String,
}

impl RewriteJob {
    pub fn new(rules: Vec<RewriteRule>) -> Self {
        Self {
            rules,
            files: Vec::new(),
        }
    }

    pub fn with_files<I>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = Utf8PathBuf>,
    {
        self.files.extend(files);
        self
    }

    /// Rewrite every file in order, stopping at the first failure.
    ///
    /// There is no rollback: files already written stay rewritten.
    pub fn run(&self, opts: &RewriteOptions) -> RewriteResult<RewriteOutcome> {
        let rules = compile_rules(&self.rules)?;
        let mut outcome = RewriteOutcome::default();
        let formatter = PatchFormatter::new();

        for path in &self.files {
            outcome.files_scanned += 1;
            let Some(change) = rewrite_file(path, &rules, opts)? else {
                continue;
            };
            outcome.patch.push_str(&render_file_patch(
                &formatter,
                path,
                &change.before,
                &change.after,
            ));
            outcome.files_changed.push(path.clone());
        }

        Ok(outcome)
    }
}

fn read(path: &Utf8Path) -> RewriteResult<Vec<u8>> {
    fs::read(path).map_err(|source| RewriteError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Utf8Path, contents: &[u8]) -> RewriteResult<()> {
    fs::write(path, contents).map_err(|source| RewriteError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn render_file_patch(
    formatter: &PatchFormatter,
    path: &Utf8Path,
    before: &[u8],
    after: &[u8],
) -> String {
    let old = String::from_utf8_lossy(before);
    let new = String::from_utf8_lossy(after);

    let mut out = String::new();
    out.push_str(&format!("diff --git a/{0} b/{0}\n", path));
    out.push_str(&format!("--- a/{0}\n+++ b/{0}\n", path));

    let patch = diffy::create_patch(&old, &new);
    out.push_str(&formatter.fmt_patch(&patch).to_string());
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}
