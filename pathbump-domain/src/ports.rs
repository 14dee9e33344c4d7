use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use pathbump_types::PackageIdentity;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("no package in {dir}")]
    NotAPackage { dir: Utf8PathBuf },

    #[error("{dir} is outside the source root {src_root}")]
    OutsideSourceRoot {
        dir: Utf8PathBuf,
        src_root: Utf8PathBuf,
    },

    #[error("read {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What inspection learns about one package directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageInfo {
    pub dir: Utf8PathBuf,
    pub identity: PackageIdentity,
    /// All imports of primary and test sources, sorted and de-duplicated.
    pub imports: Vec<String>,
    pub source_files: Vec<Utf8PathBuf>,
    pub test_files: Vec<Utf8PathBuf>,
}

impl PackageInfo {
    /// Primary sources followed by test sources.
    pub fn files(&self) -> impl Iterator<Item = &Utf8PathBuf> {
        self.source_files.iter().chain(self.test_files.iter())
    }
}

/// Package metadata resolution.
///
/// The locator only talks to this trait so it can be tested against a fake tree.
pub trait PackageInspector {
    fn inspect(&self, dir: &Utf8Path) -> Result<PackageInfo, InspectError>;

    fn is_standard_library(&self, import: &str) -> bool;
}

/// File-system backed `PackageInspector` for import-path based source trees.
///
/// A directory is a package when it directly holds at least one source file.
/// Its identity is its path relative to `src_root`.
#[derive(Debug, Clone)]
pub struct FsPackageInspector {
    src_root: Utf8PathBuf,
    extensions: Vec<String>,
    test_suffix: String,
}

impl FsPackageInspector {
    pub fn new(src_root: Utf8PathBuf) -> Self {
        Self {
            src_root,
            extensions: vec!["go".to_string()],
            test_suffix: "_test".to_string(),
        }
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_test_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.test_suffix = suffix.into();
        self
    }

    pub fn src_root(&self) -> &Utf8Path {
        &self.src_root
    }

    /// Identity of `dir` relative to the source root.
    pub fn identity_of(&self, dir: &Utf8Path) -> Result<PackageIdentity, InspectError> {
        let outside = || InspectError::OutsideSourceRoot {
            dir: dir.to_path_buf(),
            src_root: self.src_root.clone(),
        };
        let rel = dir.strip_prefix(&self.src_root).map_err(|_| outside())?;
        let segments: Vec<&str> = rel.components().map(|c| c.as_str()).collect();
        if segments.is_empty() {
            return Err(outside());
        }
        Ok(PackageIdentity::new(segments.join("/")))
    }

    fn is_source(&self, path: &Utf8Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        if name.starts_with('.') || name.starts_with('_') {
            return false;
        }
        path.extension()
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }

    fn is_test(&self, path: &Utf8Path) -> bool {
        path.file_stem()
            .is_some_and(|stem| stem.ends_with(&self.test_suffix))
    }
}

impl PackageInspector for FsPackageInspector {
    fn inspect(&self, dir: &Utf8Path) -> Result<PackageInfo, InspectError> {
        let io = |source| InspectError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut source_files = Vec::new();
        let mut test_files = Vec::new();
        for entry in fs::read_dir(dir).map_err(io)? {
            let entry = entry.map_err(io)?;
            if !entry.file_type().map_err(io)?.is_file() {
                continue;
            }
            let Ok(path) = Utf8PathBuf::from_path_buf(entry.path()) else {
                continue;
            };
            if !self.is_source(&path) {
                continue;
            }
            if self.is_test(&path) {
                test_files.push(path);
            } else {
                source_files.push(path);
            }
        }

        if source_files.is_empty() && test_files.is_empty() {
            return Err(InspectError::NotAPackage {
                dir: dir.to_path_buf(),
            });
        }
        source_files.sort();
        test_files.sort();

        let identity = self.identity_of(dir)?;

        let mut imports = BTreeSet::new();
        for file in source_files.iter().chain(test_files.iter()) {
            let text = fs::read_to_string(file).map_err(|source| InspectError::Io {
                path: file.clone(),
                source,
            })?;
            imports.extend(scan_imports_in_text(&text));
        }

        Ok(PackageInfo {
            dir: dir.to_path_buf(),
            identity,
            imports: imports.into_iter().collect(),
            source_files,
            test_files,
        })
    }

    /// Standard library paths have no dotted host in their first segment.
    fn is_standard_library(&self, import: &str) -> bool {
        let first = import.split('/').next().unwrap_or_default();
        !first.contains('.')
    }
}

static SINGLE_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*import\s+(?:[A-Za-z_.][A-Za-z0-9_]*\s+)?"([^"]+)""#)
        .expect("single import pattern")
});

// The block body runs to the first `)` outside string literals and comments.
static IMPORT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?ms)^\s*import\s*\(((?:[^)"/]|"[^"\n]*"|//[^\n]*|/\*.*?\*/|/)*)\)"#)
        .expect("import block pattern")
});

static BLOCK_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*(?:[A-Za-z_.][A-Za-z0-9_]*\s+)?"([^"]+)""#).expect("block entry pattern")
});

fn scan_imports_in_text(src: &str) -> BTreeSet<String> {
    let mut out: BTreeSet<String> = SINGLE_IMPORT
        .captures_iter(src)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect();

    for block in IMPORT_BLOCK.captures_iter(src) {
        let Some(body) = block.get(1) else { continue };
        out.extend(
            BLOCK_ENTRY
                .captures_iter(body.as_str())
                .filter_map(|c| c.get(1).map(|m| m.as_str().to_string())),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn scans_single_and_block_imports() {
        let src = r#"package t1

import "fmt"
import rt "runtime"

import (
	"gopkg.in/go-on/builtin.v1"
	_ "github.com/lib/pq"
	. "github.com/x/dot"
	// "github.com/commented/out"
)

func main() {}
"#;
        let got: Vec<String> = scan_imports_in_text(src).into_iter().collect();
        assert_eq!(
            got,
            vec![
                "fmt",
                "github.com/lib/pq",
                "github.com/x/dot",
                "gopkg.in/go-on/builtin.v1",
                "runtime",
            ]
        );
    }

    #[test]
    fn parentheses_in_block_comments_do_not_end_the_block() {
        let src = r#"package a

import (
	"fmt" // fmt.Println()
	/* os.Exit(1) */
	"os"
	"github.com/org/lib"
)
"#;
        let got: Vec<String> = scan_imports_in_text(src).into_iter().collect();
        assert_eq!(got, vec!["fmt", "github.com/org/lib", "os"]);
    }

    #[test]
    fn inspect_keeps_imports_after_commented_parenthesis() {
        let td = tempfile::tempdir().unwrap();
        let src_root = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        let dir = src_root.join("github.com/org/app");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("main.go"),
            "package main\n\nimport (\n\t\"fmt\" // fmt.Println()\n\t\"github.com/org/lib\"\n)\n",
        )
        .unwrap();

        let pkg = FsPackageInspector::new(src_root).inspect(&dir).unwrap();
        assert_eq!(pkg.imports, vec!["fmt", "github.com/org/lib"]);
    }

    #[test]
    fn string_literals_in_code_are_not_imports() {
        let src = "package a\n\nvar s = \"github.com/not/an/import\"\n";
        assert!(scan_imports_in_text(src).is_empty());
    }

    #[test]
    fn standard_library_detection() {
        let inspector = FsPackageInspector::new(Utf8PathBuf::from("/src"));
        assert!(inspector.is_standard_library("fmt"));
        assert!(inspector.is_standard_library("net/http"));
        assert!(!inspector.is_standard_library("github.com/a/b"));
        assert!(!inspector.is_standard_library("gopkg.in/a/b.v1"));
    }

    #[test]
    fn identity_is_relative_to_src_root() {
        let inspector = FsPackageInspector::new(Utf8PathBuf::from("/go/src"));
        assert_eq!(
            inspector
                .identity_of(Utf8Path::new("/go/src/github.com/a/b"))
                .unwrap()
                .as_str(),
            "github.com/a/b"
        );
        assert!(matches!(
            inspector.identity_of(Utf8Path::new("/elsewhere/a")),
            Err(InspectError::OutsideSourceRoot { .. })
        ));
        assert!(matches!(
            inspector.identity_of(Utf8Path::new("/go/src")),
            Err(InspectError::OutsideSourceRoot { .. })
        ));
    }

    #[test]
    fn source_and_test_classification() {
        let inspector = FsPackageInspector::new(Utf8PathBuf::from("/src"));
        assert!(inspector.is_source(Utf8Path::new("/src/a/main.go")));
        assert!(!inspector.is_source(Utf8Path::new("/src/a/.hidden.go")));
        assert!(!inspector.is_source(Utf8Path::new("/src/a/_ignored.go")));
        assert!(!inspector.is_source(Utf8Path::new("/src/a/README.md")));
        assert!(inspector.is_test(Utf8Path::new("/src/a/main_test.go")));
        assert!(!inspector.is_test(Utf8Path::new("/src/a/main.go")));
    }
}
