//! Shared value types for the pathbump workspace.
//!
//! # Design constraints
//! - Everything here is a pure value: no I/O, no logging.
//! - Transforms between the unversioned and versioned form of an identity are
//!   plain string functions, so they can be tested without a source tree.

pub mod identity;
pub mod version;

pub use identity::{PackageIdentity, PathError, PathScheme, PathVersion};
pub use version::{Level, Version, VersionError, latest, latest_from_tags};
