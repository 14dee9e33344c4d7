//! Configuration file loading for pathbump.
//!
//! Discovers and loads `pathbump.toml` from the package directory.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use pathbump_core::adapters::CommandInstaller;
use pathbump_types::{PathScheme, PathVersion};
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "pathbump.toml";

/// Top-level configuration from pathbump.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PathbumpConfig {
    pub paths: PathsConfig,
    pub sources: SourcesConfig,
    pub release: ReleaseConfig,
}

/// How unversioned and versioned import paths are spelled.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Host prefix of development paths.
    pub hosting: String,

    /// Host prefix of versioned paths.
    pub versioned: String,

    /// Version precision written into versioned paths on release.
    pub path_version: PathVersion,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let scheme = PathScheme::default();
        Self {
            hosting: scheme.hosting,
            versioned: scheme.versioned,
            path_version: PathVersion::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// File extensions that make a directory a package.
    pub extensions: Vec<String>,

    /// File stem suffix marking test sources.
    pub test_suffix: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["go".to_string()],
            test_suffix: "_test".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    /// Remote that `push` sends tags to.
    pub remote: String,

    /// Commands run after pushing; `{package}` expands to the released path.
    pub install: Vec<Vec<String>>,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            install: CommandInstaller::default_commands(),
        }
    }
}

/// Discover the pathbump.toml config file in `dir`.
pub fn discover_config(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a pathbump.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<PathbumpConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<PathbumpConfig> {
    let config: PathbumpConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from `dir`, or return defaults if there is none.
pub fn load_or_default(dir: &Utf8Path) -> anyhow::Result<PathbumpConfig> {
    match discover_config(dir) {
        Some(path) => load_config(&path),
        None => Ok(PathbumpConfig::default()),
    }
}

/// Command-line values that override the config file when present.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub hosting: Option<String>,
    pub versioned: Option<String>,
    pub path_version: Option<PathVersion>,
    pub remote: Option<String>,
}

/// Effective settings after merging file and CLI.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub scheme: PathScheme,
    pub path_version: PathVersion,
    pub extensions: Vec<String>,
    pub test_suffix: String,
    pub remote: String,
    pub install: Vec<Vec<String>>,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: PathbumpConfig,
}

impl ConfigMerger {
    pub fn new(config: PathbumpConfig) -> Self {
        Self { config }
    }

    pub fn merge(self, cli: CliOverrides) -> MergedConfig {
        let PathbumpConfig {
            paths,
            sources,
            release,
        } = self.config;

        MergedConfig {
            scheme: PathScheme::new(
                cli.hosting.unwrap_or(paths.hosting),
                cli.versioned.unwrap_or(paths.versioned),
            ),
            path_version: cli.path_version.unwrap_or(paths.path_version),
            extensions: sources.extensions,
            test_suffix: sources.test_suffix,
            remote: cli.remote.unwrap_or(release.remote),
            install: release.install,
        }
    }
}
