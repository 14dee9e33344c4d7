//! Entry points for develop, release, replace and the read-only listings.
//!
//! Each function resolves the package at [`WorkspaceSettings::dir`], finds the
//! dependents below that directory, and rewrites their sources in place
//! through a [`RewriteJob`].

use crate::error::ReleaseError;
use crate::ports::{CreateTagError, Installer, RepositoryClient};
use crate::settings::{ReleaseSettings, WorkspaceSettings};
use camino::Utf8PathBuf;
use pathbump_domain::{
    DependentSet, ImportMatch, PackageInfo, PackageInspector, dependents, dependents_by_prefix,
    dependents_matching, external_imports,
};
use pathbump_edit::{RewriteJob, RewriteOptions, RewriteOutcome, RewriteRule};
use pathbump_types::{PackageIdentity, Version, latest_from_tags};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct DevelopOutcome {
    pub package: PackageIdentity,
    /// Versioned family prefix that was replaced, e.g. `gopkg.in/a/b`.
    pub family: String,
    pub dependents: Vec<PackageIdentity>,
    pub rewrite: RewriteOutcome,
}

#[derive(Debug, Clone)]
pub struct ReleaseOutcome {
    pub package: PackageIdentity,
    pub previous: Version,
    pub version: Version,
    /// Import path dependents now use, e.g. `gopkg.in/a/b.v2`.
    pub target_path: String,
    pub dependents: Vec<PackageIdentity>,
    pub rewrite: RewriteOutcome,
    /// Set once the tag exists in the repository.
    pub tag: Option<String>,
    pub pushed: bool,
    pub installed: bool,
}

#[derive(Debug, Clone)]
pub struct ReplaceOutcome {
    pub dependents: Vec<PackageIdentity>,
    pub rewrite: RewriteOutcome,
}

/// The package and the packages below it that import it.
#[derive(Debug, Clone)]
pub struct DependentsListing {
    pub package: PackageIdentity,
    pub dependents: Vec<PackageIdentity>,
}

fn resolve(
    settings: &WorkspaceSettings,
    inspector: &dyn PackageInspector,
) -> Result<PackageInfo, ReleaseError> {
    let pkg = inspector.inspect(&settings.dir)?;
    debug!(package = %pkg.identity, dir = %settings.dir, "resolved package");
    Ok(pkg)
}

fn source_files(set: &DependentSet) -> Vec<Utf8PathBuf> {
    set.iter().flat_map(|p| p.files().cloned()).collect()
}

fn identities(set: &DependentSet) -> Vec<PackageIdentity> {
    set.identities().cloned().collect()
}

fn run_rewrite(
    settings: &WorkspaceSettings,
    rules: Vec<RewriteRule>,
    set: &DependentSet,
) -> Result<RewriteOutcome, ReleaseError> {
    let outcome = RewriteJob::new(rules).with_files(source_files(set)).run(&RewriteOptions {
        dry_run: settings.dry_run,
    })?;
    info!(
        scanned = outcome.files_scanned,
        changed = outcome.files_changed.len(),
        dry_run = settings.dry_run,
        "rewrite finished"
    );
    Ok(outcome)
}

/// Point every dependent importing any version of this package back at its
/// unversioned hosting path.
pub fn switch_to_development(
    settings: &WorkspaceSettings,
    inspector: &dyn PackageInspector,
) -> Result<DevelopOutcome, ReleaseError> {
    let pkg = resolve(settings, inspector)?;
    let family = settings.scheme.bare_versioned(&pkg.identity)?;

    let deps = dependents_by_prefix(&settings.dir, inspector, &family);
    info!(family = %family, dependents = deps.len(), "switching to development path");

    let rules = vec![RewriteRule::versioned_family(
        family.clone(),
        pkg.identity.as_str(),
    )];
    let rewrite = run_rewrite(settings, rules, &deps)?;

    Ok(DevelopOutcome {
        package: pkg.identity,
        family,
        dependents: identities(&deps),
        rewrite,
    })
}

/// Bump the latest tagged version, point dependents at the new versioned path
/// and, in publish mode, tag HEAD, push the tags and install the release.
///
/// Rewritten files are not committed; the tag is placed on the current HEAD.
/// When installation fails the tag stays in place and
/// [`ReleaseError::Install`] is returned.
pub fn cut_release(
    settings: &WorkspaceSettings,
    release: &ReleaseSettings,
    inspector: &dyn PackageInspector,
    repo: &dyn RepositoryClient,
    installer: &dyn Installer,
) -> Result<ReleaseOutcome, ReleaseError> {
    let pkg = resolve(settings, inspector)?;
    let family = settings.scheme.bare_versioned(&pkg.identity)?;

    let tags = repo.list_tags().map_err(ReleaseError::repository)?;
    for tag in tags.iter().filter(|t| Version::parse(t).is_err()) {
        debug!(tag = %tag, "ignoring non-version tag");
    }
    let previous = latest_from_tags(&tags)?;
    let version = previous.bump(release.level)?;
    info!(previous = %previous, next = %version, level = %release.level, "computed release version");

    let target_path = settings
        .scheme
        .versioned_path(&pkg.identity, settings.path_version.apply(version))?;

    let deps = dependents_matching(
        &settings.dir,
        inspector,
        &[
            ImportMatch::Within(pkg.identity.clone()),
            ImportMatch::Prefix(family.clone()),
        ],
    );
    let rules = vec![
        RewriteRule::versioned_family(family, target_path.clone()),
        RewriteRule::bare_path(pkg.identity.as_str(), target_path.clone()),
    ];
    let rewrite = run_rewrite(settings, rules, &deps)?;

    let mut outcome = ReleaseOutcome {
        package: pkg.identity,
        previous,
        version,
        target_path,
        dependents: identities(&deps),
        rewrite,
        tag: None,
        pushed: false,
        installed: false,
    };

    if !release.publishes() {
        return Ok(outcome);
    }
    if settings.dry_run {
        info!(tag = %version, "dry run: not tagging");
        return Ok(outcome);
    }

    let tag = version.to_string();
    let commit = repo.current_commit().map_err(ReleaseError::repository)?;
    match repo.create_tag(&tag, &commit) {
        Ok(()) => {}
        Err(CreateTagError::AlreadyExists) => return Err(ReleaseError::TagAlreadyExists { tag }),
        Err(CreateTagError::Other(err)) => return Err(ReleaseError::Repository(err)),
    }
    info!(tag = %tag, commit = %commit, "created tag");
    outcome.tag = Some(tag.clone());

    repo.push_tags().map_err(ReleaseError::repository)?;
    outcome.pushed = true;

    let package = settings
        .scheme
        .versioned_path(&outcome.package, version.major_only())?;
    if let Err(source) = installer.install(&package) {
        warn!(package = %package, error = %source, "install failed; tag kept");
        return Err(ReleaseError::Install {
            tag,
            package,
            source,
        });
    }
    outcome.installed = true;

    Ok(outcome)
}

/// Rewrite every exact import of `src` below the working directory to `target`.
pub fn replace_import(
    settings: &WorkspaceSettings,
    inspector: &dyn PackageInspector,
    src: &str,
    target: &str,
) -> Result<ReplaceOutcome, ReleaseError> {
    let deps = dependents(&settings.dir, inspector, src);
    info!(from = src, to = target, dependents = deps.len(), "replacing import");
    let rewrite = run_rewrite(settings, vec![RewriteRule::exact_import(src, target)], &deps)?;
    Ok(ReplaceOutcome {
        dependents: identities(&deps),
        rewrite,
    })
}

/// Non-standard-library imports of the package at the working directory.
pub fn list_imports(
    settings: &WorkspaceSettings,
    inspector: &dyn PackageInspector,
) -> Result<Vec<String>, ReleaseError> {
    let pkg = resolve(settings, inspector)?;
    Ok(external_imports(inspector, &pkg)
        .into_iter()
        .map(str::to_string)
        .collect())
}

/// Packages below the working directory importing this package, under its
/// hosting path or any versioned path of its family.
pub fn list_dependents(
    settings: &WorkspaceSettings,
    inspector: &dyn PackageInspector,
) -> Result<DependentsListing, ReleaseError> {
    let pkg = resolve(settings, inspector)?;
    let mut matchers = vec![ImportMatch::Within(pkg.identity.clone())];
    match settings.scheme.bare_versioned(&pkg.identity) {
        Ok(family) => matchers.push(ImportMatch::Prefix(family)),
        Err(err) => debug!(error = %err, "no versioned family"),
    }
    let deps = dependents_matching(&settings.dir, inspector, &matchers);
    Ok(DependentsListing {
        package: pkg.identity,
        dependents: identities(&deps),
    })
}
