//! Embeddable core library for pathbump.
//!
//! Provides a clap-free entry point for the develop, release and replace
//! verbs, suitable for linking into another host process.
//!
//! # Port traits
//!
//! Version control and post-release installation sit behind port traits in [`ports`]:
//! - [`RepositoryClient`](ports::RepositoryClient) — list/create/push tags, read HEAD
//! - [`Installer`](ports::Installer) — fetch and install a freshly released package
//!
//! Package inspection is the domain's
//! [`PackageInspector`](pathbump_domain::PackageInspector).
//!
//! The [`adapters`] module provides default shell-backed implementations.
//!
//! # Entry points
//!
//! - [`switch_to_development`](pipeline::switch_to_development)
//! - [`cut_release`](pipeline::cut_release)
//! - [`replace_import`](pipeline::replace_import)
//! - [`list_imports`](pipeline::list_imports) / [`list_dependents`](pipeline::list_dependents)

pub mod adapters;
pub mod error;
pub mod pipeline;
pub mod ports;
pub mod settings;

pub use error::ReleaseError;

// Re-export the inspector so callers don't need pathbump-domain directly.
pub use pathbump_domain::{FsPackageInspector, PackageInspector};
