//! Default shell-backed port implementations.

use crate::ports::{CreateTagError, Installer, RepositoryClient};
use anyhow::{Context, bail};
use camino::{Utf8Path, Utf8PathBuf};
use std::cell::RefCell;
use std::process::Command;
use tracing::{debug, info};

fn run_git(args: &[&str], cwd: &Utf8Path, verbose: bool) -> anyhow::Result<String> {
    if verbose {
        info!(cwd = %cwd, "git {}", args.join(" "));
    } else {
        debug!(cwd = %cwd, ?args, "running git");
    }
    let out = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .context("failed to execute git")?;
    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        bail!("git {:?} failed: {}", args, stderr.trim());
    }
    Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
}

/// Repository handle driving the `git` binary.
#[derive(Debug, Clone)]
pub struct GitCli {
    dir: Utf8PathBuf,
    remote: String,
    verbose: bool,
}

impl GitCli {
    /// Open the repository containing `dir`. Fails if `dir` is not inside a work tree.
    pub fn open(dir: &Utf8Path, remote: impl Into<String>) -> anyhow::Result<Self> {
        run_git(&["rev-parse", "--git-dir"], dir, false)
            .with_context(|| format!("open repository at {}", dir))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            remote: remote.into(),
            verbose: false,
        })
    }

    /// Log every git invocation at info level.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn git(&self, args: &[&str]) -> anyhow::Result<String> {
        run_git(args, &self.dir, self.verbose)
    }

    fn has_tag(&self, name: &str) -> bool {
        let reference = format!("refs/tags/{name}");
        self.git(&["rev-parse", "-q", "--verify", &reference]).is_ok()
    }
}

impl RepositoryClient for GitCli {
    fn list_tags(&self) -> anyhow::Result<Vec<String>> {
        let out = self.git(&["tag", "--list"])?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn create_tag(&self, name: &str, commit: &str) -> Result<(), CreateTagError> {
        if self.has_tag(name) {
            return Err(CreateTagError::AlreadyExists);
        }
        self.git(&["tag", name, commit])?;
        Ok(())
    }

    fn push_tags(&self) -> anyhow::Result<()> {
        self.git(&["push", &self.remote, "--tags"])?;
        Ok(())
    }

    fn current_commit(&self) -> anyhow::Result<String> {
        self.git(&["rev-parse", "HEAD"])
    }
}

/// Runs a fixed list of commands, substituting `{package}` in every argument.
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    commands: Vec<Vec<String>>,
    cwd: Utf8PathBuf,
    verbose: bool,
}

impl CommandInstaller {
    pub fn new(commands: Vec<Vec<String>>, cwd: Utf8PathBuf) -> Self {
        Self {
            commands,
            cwd,
            verbose: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// `go get {package}` then `go install {package}/...`.
    pub fn default_commands() -> Vec<Vec<String>> {
        vec![
            vec!["go".into(), "get".into(), "{package}".into()],
            vec!["go".into(), "install".into(), "{package}/...".into()],
        ]
    }

    fn expand(&self, package: &str) -> Vec<Vec<String>> {
        self.commands
            .iter()
            .map(|cmd| cmd.iter().map(|a| a.replace("{package}", package)).collect())
            .collect()
    }
}

impl Installer for CommandInstaller {
    fn install(&self, package: &str) -> anyhow::Result<()> {
        for argv in self.expand(package) {
            let Some((program, args)) = argv.split_first() else {
                continue;
            };
            if self.verbose {
                info!(cwd = %self.cwd, "{}", argv.join(" "));
            }
            let out = Command::new(program)
                .args(args)
                .current_dir(&self.cwd)
                .output()
                .with_context(|| format!("failed to execute {program}"))?;
            if !out.status.success() {
                let stderr = String::from_utf8_lossy(&out.stderr);
                bail!("{:?} failed: {}", argv, stderr.trim());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct RepoState {
    tags: Vec<(String, String)>,
    pushes: usize,
}

/// In-memory repository for embedding and testing.
#[derive(Debug)]
pub struct InMemoryRepository {
    head: String,
    state: RefCell<RepoState>,
}

impl InMemoryRepository {
    pub fn new<I, S>(tags: I, head: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let head = head.into();
        let tags = tags.into_iter().map(|t| (t.into(), head.clone())).collect();
        Self {
            head,
            state: RefCell::new(RepoState { tags, pushes: 0 }),
        }
    }

    /// Tags as `(name, commit)` pairs in creation order.
    pub fn tags(&self) -> Vec<(String, String)> {
        self.state.borrow().tags.clone()
    }

    pub fn pushes(&self) -> usize {
        self.state.borrow().pushes
    }
}

impl RepositoryClient for InMemoryRepository {
    fn list_tags(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.state.borrow().tags.iter().map(|(n, _)| n.clone()).collect())
    }

    fn create_tag(&self, name: &str, commit: &str) -> Result<(), CreateTagError> {
        let mut state = self.state.borrow_mut();
        if state.tags.iter().any(|(n, _)| n == name) {
            return Err(CreateTagError::AlreadyExists);
        }
        state.tags.push((name.to_string(), commit.to_string()));
        Ok(())
    }

    fn push_tags(&self) -> anyhow::Result<()> {
        self.state.borrow_mut().pushes += 1;
        Ok(())
    }

    fn current_commit(&self) -> anyhow::Result<String> {
        Ok(self.head.clone())
    }
}
