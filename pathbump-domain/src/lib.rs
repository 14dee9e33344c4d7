//! Domain logic: find the packages in a source tree that depend on a target.
//!
//! This crate owns *which* files need rewriting. It does not own *how* they are
//! rewritten; that's the `pathbump-edit` crate.

mod locator;
mod ports;
mod scanner;

pub use locator::{
    DependentSet, ImportMatch, dependents, dependents_by_prefix, dependents_matching,
    external_imports,
};
pub use ports::{FsPackageInspector, InspectError, PackageInfo, PackageInspector};
pub use scanner::{TreeScan, scan};
