//! End-to-end pipeline tests over a temporary source tree and an in-memory repository.

use camino::Utf8PathBuf;
use fs_err as fs;
use pathbump_core::adapters::InMemoryRepository;
use pathbump_core::pipeline::{
    cut_release, list_dependents, list_imports, replace_import, switch_to_development,
};
use pathbump_core::ports::{CreateTagError, Installer, RepositoryClient};
use pathbump_core::settings::{ReleaseMode, ReleaseSettings, WorkspaceSettings};
use pathbump_core::{FsPackageInspector, ReleaseError};
use pathbump_domain::InspectError;
use pathbump_types::{Level, PathError, PathVersion, Version, VersionError};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use tempfile::TempDir;

const LIB: &str = "github.com/org/lib";

struct Tree {
    _temp: TempDir,
    src: Utf8PathBuf,
}

impl Tree {
    fn write(&self, rel: &str, contents: &str) -> Utf8PathBuf {
        let path = self.src.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.src.join(rel)).unwrap()
    }

    fn inspector(&self) -> FsPackageInspector {
        FsPackageInspector::new(self.src.clone())
    }

    fn settings(&self, identity: &str) -> WorkspaceSettings {
        WorkspaceSettings::new(self.src.join(identity))
    }
}

fn go_file(pkg: &str, imports: &[&str]) -> String {
    let mut s = format!("package {pkg}\n\nimport (\n");
    for imp in imports {
        s.push_str(&format!("\t\"{imp}\"\n"));
    }
    s.push_str(")\n");
    s
}

/// `lib` with a versioned importer (`sub`), a hosting-path importer
/// (`cmd/tool`) and a lookalike importer (`other`).
fn fixture() -> Tree {
    let temp = tempfile::tempdir().unwrap();
    let src = Utf8PathBuf::from_path_buf(temp.path().join("src")).unwrap();
    let tree = Tree { _temp: temp, src };
    tree.write(&format!("{LIB}/lib.go"), &go_file("lib", &["fmt"]));
    tree.write(
        &format!("{LIB}/sub/sub.go"),
        &go_file("sub", &["strings", "gopkg.in/org/lib.v1"]),
    );
    tree.write(
        &format!("{LIB}/cmd/tool/main.go"),
        &go_file("main", &["os", "github.com/org/lib", "github.com/org/lib/sub"]),
    );
    tree.write(
        &format!("{LIB}/other/other.go"),
        &go_file("other", &["github.com/org/library"]),
    );
    tree
}

#[derive(Default)]
struct RecordingInstaller {
    installed: RefCell<Vec<String>>,
    fail: bool,
}

impl Installer for RecordingInstaller {
    fn install(&self, package: &str) -> anyhow::Result<()> {
        self.installed.borrow_mut().push(package.to_string());
        if self.fail {
            anyhow::bail!("go: cannot find module");
        }
        Ok(())
    }
}

/// A repository that lost a race: the tag appears between listing and creating.
struct RacingRepository;

impl RepositoryClient for RacingRepository {
    fn list_tags(&self) -> anyhow::Result<Vec<String>> {
        Ok(vec!["v1.0".to_string()])
    }
    fn create_tag(&self, _name: &str, _commit: &str) -> Result<(), CreateTagError> {
        Err(CreateTagError::AlreadyExists)
    }
    fn push_tags(&self) -> anyhow::Result<()> {
        Ok(())
    }
    fn current_commit(&self) -> anyhow::Result<String> {
        Ok("abc".to_string())
    }
}

fn sorted(ids: &[pathbump_types::PackageIdentity]) -> Vec<String> {
    let mut v: Vec<String> = ids.iter().map(|i| i.to_string()).collect();
    v.sort();
    v
}

#[test]
fn develop_points_versioned_importers_at_hosting_path() {
    let tree = fixture();
    let outcome = switch_to_development(&tree.settings(LIB), &tree.inspector()).unwrap();

    assert_eq!(outcome.package.as_str(), LIB);
    assert_eq!(outcome.family, "gopkg.in/org/lib");
    assert_eq!(sorted(&outcome.dependents), vec![format!("{LIB}/sub")]);
    assert_eq!(
        tree.read(&format!("{LIB}/sub/sub.go")),
        go_file("sub", &["strings", "github.com/org/lib"])
    );
    assert_eq!(
        tree.read(&format!("{LIB}/other/other.go")),
        go_file("other", &["github.com/org/library"])
    );
}

#[test]
fn develop_twice_changes_nothing_the_second_time() {
    let tree = fixture();
    switch_to_development(&tree.settings(LIB), &tree.inspector()).unwrap();
    let second = switch_to_development(&tree.settings(LIB), &tree.inspector()).unwrap();
    assert!(second.dependents.is_empty());
    assert!(second.rewrite.files_changed.is_empty());
}

#[test]
fn release_rewrites_with_major_path_by_default() {
    let tree = fixture();
    let repo = InMemoryRepository::new(["v1.2", "not-a-version", "v0.9.4"], "deadbeef");
    let installer = RecordingInstaller::default();

    let outcome = cut_release(
        &tree.settings(LIB),
        &ReleaseSettings::new(Level::Minor, ReleaseMode::RewriteOnly),
        &tree.inspector(),
        &repo,
        &installer,
    )
    .unwrap();

    assert_eq!(outcome.previous, Version::new(1, 2, 0));
    assert_eq!(outcome.version, Version::new(1, 3, 0));
    assert_eq!(outcome.target_path, "gopkg.in/org/lib.v1");
    assert_eq!(
        sorted(&outcome.dependents),
        vec![format!("{LIB}/cmd/tool"), format!("{LIB}/sub")]
    );
    assert_eq!(
        tree.read(&format!("{LIB}/cmd/tool/main.go")),
        go_file(
            "main",
            &["os", "gopkg.in/org/lib.v1", "gopkg.in/org/lib.v1/sub"]
        )
    );
    assert_eq!(
        tree.read(&format!("{LIB}/other/other.go")),
        go_file("other", &["github.com/org/library"])
    );

    assert_eq!(outcome.tag, None);
    assert_eq!(repo.tags().len(), 3);
    assert!(installer.installed.borrow().is_empty());
}

#[test]
fn release_with_full_path_version() {
    let tree = fixture();
    let mut settings = tree.settings(LIB);
    settings.path_version = PathVersion::Full;
    let repo = InMemoryRepository::new(["v1.2"], "deadbeef");

    let outcome = cut_release(
        &settings,
        &ReleaseSettings::new(Level::Patch, ReleaseMode::RewriteOnly),
        &tree.inspector(),
        &repo,
        &RecordingInstaller::default(),
    )
    .unwrap();

    assert_eq!(outcome.target_path, "gopkg.in/org/lib.v1.2.1");
    assert_eq!(
        tree.read(&format!("{LIB}/sub/sub.go")),
        go_file("sub", &["strings", "gopkg.in/org/lib.v1.2.1"])
    );
}

#[test]
fn publish_tags_pushes_and_installs() {
    let tree = fixture();
    let repo = InMemoryRepository::new(["v1.2"], "deadbeef");
    let installer = RecordingInstaller::default();

    let outcome = cut_release(
        &tree.settings(LIB),
        &ReleaseSettings::new(Level::Major, ReleaseMode::Publish),
        &tree.inspector(),
        &repo,
        &installer,
    )
    .unwrap();

    assert_eq!(outcome.tag.as_deref(), Some("v2"));
    assert!(outcome.pushed);
    assert!(outcome.installed);
    assert_eq!(
        repo.tags().last().cloned(),
        Some(("v2".to_string(), "deadbeef".to_string()))
    );
    assert_eq!(repo.pushes(), 1);
    assert_eq!(*installer.installed.borrow(), vec!["gopkg.in/org/lib.v2"]);
}

#[test]
fn failed_install_keeps_the_tag() {
    let tree = fixture();
    let repo = InMemoryRepository::new(["v0.1"], "deadbeef");
    let installer = RecordingInstaller {
        fail: true,
        ..Default::default()
    };

    let err = cut_release(
        &tree.settings(LIB),
        &ReleaseSettings::new(Level::Minor, ReleaseMode::Publish),
        &tree.inspector(),
        &repo,
        &installer,
    )
    .unwrap_err();

    match err {
        ReleaseError::Install { tag, package, .. } => {
            assert_eq!(tag, "v0.2");
            assert_eq!(package, "gopkg.in/org/lib.v0");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(repo.tags().iter().any(|(name, _)| name == "v0.2"));
}

#[test]
fn dry_run_publish_touches_nothing() {
    let tree = fixture();
    let mut settings = tree.settings(LIB);
    settings.dry_run = true;
    let repo = InMemoryRepository::new(["v1.2"], "deadbeef");
    let before = tree.read(&format!("{LIB}/cmd/tool/main.go"));

    let outcome = cut_release(
        &settings,
        &ReleaseSettings::new(Level::Minor, ReleaseMode::Publish),
        &tree.inspector(),
        &repo,
        &RecordingInstaller::default(),
    )
    .unwrap();

    assert!(outcome.rewrite.patch.contains("+\t\"gopkg.in/org/lib.v1\""));
    assert_eq!(tree.read(&format!("{LIB}/cmd/tool/main.go")), before);
    assert_eq!(outcome.tag, None);
    assert_eq!(repo.tags().len(), 1);
    assert_eq!(repo.pushes(), 0);
}

#[test]
fn release_without_version_tags_fails_before_rewriting() {
    let tree = fixture();
    let repo = InMemoryRepository::new(["latest", "release-1"], "deadbeef");
    let before = tree.read(&format!("{LIB}/cmd/tool/main.go"));

    let err = cut_release(
        &tree.settings(LIB),
        &ReleaseSettings::new(Level::Patch, ReleaseMode::Publish),
        &tree.inspector(),
        &repo,
        &RecordingInstaller::default(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        ReleaseError::Version(VersionError::NoVersionsAvailable)
    ));
    assert_eq!(tree.read(&format!("{LIB}/cmd/tool/main.go")), before);
}

#[test]
fn release_past_the_largest_major_fails_before_tagging() {
    let tree = fixture();
    let repo = InMemoryRepository::new(["v18446744073709551615"], "deadbeef");
    let before = tree.read(&format!("{LIB}/cmd/tool/main.go"));

    let err = cut_release(
        &tree.settings(LIB),
        &ReleaseSettings::new(Level::Major, ReleaseMode::Publish),
        &tree.inspector(),
        &repo,
        &RecordingInstaller::default(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        ReleaseError::Version(VersionError::Overflow {
            level: Level::Major,
            ..
        })
    ));
    assert_eq!(tree.read(&format!("{LIB}/cmd/tool/main.go")), before);
    assert_eq!(repo.tags().len(), 1);
}

#[test]
fn existing_tag_is_reported() {
    let tree = fixture();
    let err = cut_release(
        &tree.settings(LIB),
        &ReleaseSettings::new(Level::Minor, ReleaseMode::Publish),
        &tree.inspector(),
        &RacingRepository,
        &RecordingInstaller::default(),
    )
    .unwrap_err();

    match err {
        ReleaseError::TagAlreadyExists { tag } => assert_eq!(tag, "v1.1"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn release_outside_hosting_is_not_versionable() {
    let tree = fixture();
    tree.write("example.com/x/x.go", &go_file("x", &[]));
    let repo = InMemoryRepository::new(["v1.0"], "deadbeef");

    let err = cut_release(
        &tree.settings("example.com/x"),
        &ReleaseSettings::new(Level::Minor, ReleaseMode::RewriteOnly),
        &tree.inspector(),
        &repo,
        &RecordingInstaller::default(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        ReleaseError::Path(PathError::NotAVersionablePath { .. })
    ));
}

#[test]
fn develop_in_empty_directory_is_not_a_package() {
    let tree = fixture();
    fs::create_dir_all(tree.src.join("github.com/org/empty")).unwrap();
    let err =
        switch_to_development(&tree.settings("github.com/org/empty"), &tree.inspector())
            .unwrap_err();
    assert!(matches!(
        err,
        ReleaseError::Inspect(InspectError::NotAPackage { .. })
    ));
}

#[test]
fn replace_rewrites_exact_imports_only() {
    let tree = fixture();
    let outcome = replace_import(
        &tree.settings(LIB),
        &tree.inspector(),
        "github.com/org/lib",
        "github.com/fork/lib",
    )
    .unwrap();

    assert_eq!(sorted(&outcome.dependents), vec![format!("{LIB}/cmd/tool")]);
    assert_eq!(
        tree.read(&format!("{LIB}/cmd/tool/main.go")),
        go_file(
            "main",
            &["os", "github.com/fork/lib", "github.com/org/lib/sub"]
        )
    );
}

#[test]
fn imports_exclude_standard_library() {
    let tree = fixture();
    let imports =
        list_imports(&tree.settings(&format!("{LIB}/cmd/tool")), &tree.inspector()).unwrap();
    assert_eq!(imports, vec!["github.com/org/lib", "github.com/org/lib/sub"]);
}

#[test]
fn dependents_cover_hosting_and_versioned_importers() {
    let tree = fixture();
    let listing = list_dependents(&tree.settings(LIB), &tree.inspector()).unwrap();
    assert_eq!(listing.package.as_str(), LIB);
    assert_eq!(
        sorted(&listing.dependents),
        vec![format!("{LIB}/cmd/tool"), format!("{LIB}/sub")]
    );
}
