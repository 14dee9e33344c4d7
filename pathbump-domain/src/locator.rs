use crate::ports::{PackageInfo, PackageInspector};
use crate::scanner::scan;
use camino::Utf8Path;
use pathbump_types::PackageIdentity;
use tracing::debug;

/// How an import path is tested against a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportMatch {
    /// The import equals the target.
    Exact(String),
    /// The import starts with the target as a plain string prefix, so
    /// `foo/barbaz` matches `foo/bar`.
    Prefix(String),
    /// The import is the target or one of its sub-packages.
    Within(PackageIdentity),
}

impl ImportMatch {
    pub fn matches(&self, import: &str) -> bool {
        match self {
            ImportMatch::Exact(target) => import == target,
            ImportMatch::Prefix(prefix) => import.starts_with(prefix.as_str()),
            ImportMatch::Within(identity) => identity.contains(import),
        }
    }
}

/// Dependent packages in discovery order, at most one entry per identity.
#[derive(Debug, Clone, Default)]
pub struct DependentSet {
    packages: Vec<PackageInfo>,
}

impl DependentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `pkg` unless its identity is already present.
    pub fn insert(&mut self, pkg: PackageInfo) -> bool {
        if self.contains(&pkg.identity) {
            return false;
        }
        self.packages.push(pkg);
        true
    }

    pub fn contains(&self, identity: &PackageIdentity) -> bool {
        self.packages.iter().any(|p| &p.identity == identity)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PackageInfo> {
        self.packages.iter()
    }

    pub fn identities(&self) -> impl Iterator<Item = &PackageIdentity> {
        self.packages.iter().map(|p| &p.identity)
    }
}

impl Extend<PackageInfo> for DependentSet {
    fn extend<T: IntoIterator<Item = PackageInfo>>(&mut self, iter: T) {
        for pkg in iter {
            self.insert(pkg);
        }
    }
}

impl<'a> IntoIterator for &'a DependentSet {
    type Item = &'a PackageInfo;
    type IntoIter = std::slice::Iter<'a, PackageInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.packages.iter()
    }
}

/// Imports of `pkg` that are not part of the standard library.
pub fn external_imports<'p>(
    inspector: &dyn PackageInspector,
    pkg: &'p PackageInfo,
) -> Vec<&'p str> {
    pkg.imports
        .iter()
        .map(String::as_str)
        .filter(|imp| !inspector.is_standard_library(imp))
        .collect()
}

/// Packages under `root` that import `target` exactly.
pub fn dependents(root: &Utf8Path, inspector: &dyn PackageInspector, target: &str) -> DependentSet {
    dependents_matching(root, inspector, &[ImportMatch::Exact(target.to_string())])
}

/// Packages under `root` with any import starting with `prefix`.
pub fn dependents_by_prefix(
    root: &Utf8Path,
    inspector: &dyn PackageInspector,
    prefix: &str,
) -> DependentSet {
    dependents_matching(root, inspector, &[ImportMatch::Prefix(prefix.to_string())])
}

/// Packages under `root` with an external import satisfying any of `matchers`.
///
/// One walk serves all matchers.
pub fn dependents_matching(
    root: &Utf8Path,
    inspector: &dyn PackageInspector,
    matchers: &[ImportMatch],
) -> DependentSet {
    let mut set = DependentSet::new();
    for pkg in scan(root, inspector) {
        let hit = external_imports(inspector, &pkg)
            .into_iter()
            .any(|imp| matchers.iter().any(|m| m.matches(imp)));
        if hit {
            debug!(package = %pkg.identity, "found dependent");
            set.insert(pkg);
        }
    }
    set
}
