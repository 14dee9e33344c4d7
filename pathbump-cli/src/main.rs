mod config;
mod source_root;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use config::{CliOverrides, ConfigMerger, MergedConfig};
use pathbump_core::adapters::{CommandInstaller, GitCli};
use pathbump_core::pipeline::{
    cut_release, list_dependents, list_imports, replace_import, switch_to_development,
};
use pathbump_core::settings::{ReleaseMode, ReleaseSettings, WorkspaceSettings};
use pathbump_core::{FsPackageInspector, ReleaseError};
use pathbump_types::PathVersion;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "pathbump",
    version,
    about = "Switch dependents between development and versioned import paths, and cut releases."
)]
struct Cli {
    /// Package directory (default: current directory).
    #[arg(long, short = 'd', global = true, default_value = ".")]
    dir: Utf8PathBuf,

    /// Directory import paths are relative to (default: $GOPATH/src or the nearest `src` ancestor).
    #[arg(long, global = true, env = "PATHBUMP_SRC_ROOT")]
    src_root: Option<Utf8PathBuf>,

    /// Host prefix of development import paths.
    #[arg(long, global = true)]
    hosting: Option<String>,

    /// Host prefix of versioned import paths.
    #[arg(long, global = true)]
    versioned: Option<String>,

    /// Log at debug level and echo every external command.
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Point dependents importing a versioned path back at the development path.
    Develop(DevelopArgs),
    /// Compute the next version and point dependents at it.
    Release(ReleaseArgs),
    /// Release, then tag HEAD, push the tags and install the new version.
    Push(PushArgs),
    /// Replace an exact import path in every package below the directory.
    Replace(ReplaceArgs),
    /// List the non-standard-library imports of the package.
    Imports(ListArgs),
    /// List the package followed by the packages below it that import it.
    Deps(ListArgs),
}

#[derive(Debug, Parser)]
struct DevelopArgs {
    /// Print the diff instead of writing files.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Debug, Parser)]
struct ReleaseArgs {
    /// Version component to increment (major, minor, patch).
    #[arg(long, short = 's')]
    step: String,

    /// Version precision written into import paths.
    #[arg(long, value_enum)]
    path_version: Option<PathVersionArg>,

    /// Print the diff instead of writing files.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Debug, Parser)]
struct PushArgs {
    /// Version component to increment (major, minor, patch).
    #[arg(long, short = 's')]
    step: String,

    /// Version precision written into import paths.
    #[arg(long, value_enum)]
    path_version: Option<PathVersionArg>,

    /// Remote to push tags to (default: origin).
    #[arg(long)]
    remote: Option<String>,
}

#[derive(Debug, Parser)]
struct ReplaceArgs {
    /// Import path to replace.
    #[arg(long)]
    src: String,

    /// Replacement import path.
    #[arg(long)]
    target: String,

    /// Print the diff instead of writing files.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Debug, Parser)]
struct ListArgs {
    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum PathVersionArg {
    Major,
    Full,
}

impl From<PathVersionArg> for PathVersion {
    fn from(arg: PathVersionArg) -> Self {
        match arg {
            PathVersionArg::Major => PathVersion::Major,
            PathVersionArg::Full => PathVersion::Full,
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version land here too.
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::from(0)
            };
        }
    };
    init_tracing(cli.verbose);

    if let Err(e) = real_main(cli) {
        error!("{:?}", e);
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Everything a command needs, resolved once from CLI, config file and environment.
struct Workspace {
    settings: WorkspaceSettings,
    inspector: FsPackageInspector,
    merged: MergedConfig,
    verbose: bool,
}

fn prepare(cli: &Cli, overrides: CliOverrides, dry_run: bool) -> anyhow::Result<Workspace> {
    let dir = source_root::canonical(&cli.dir).with_context(|| format!("open {}", cli.dir))?;
    let src_root = source_root::resolve(
        &dir,
        cli.src_root.as_deref(),
        std::env::var_os("GOPATH").as_deref(),
    )?;

    let file_config = config::load_or_default(&dir).context("load pathbump.toml config")?;
    let merged = ConfigMerger::new(file_config).merge(CliOverrides {
        hosting: cli.hosting.clone(),
        versioned: cli.versioned.clone(),
        ..overrides
    });
    debug!(
        "merged config: scheme={:?}, path_version={:?}, remote={}",
        merged.scheme, merged.path_version, merged.remote
    );

    let inspector = FsPackageInspector::new(src_root)
        .with_extensions(merged.extensions.clone())
        .with_test_suffix(merged.test_suffix.clone());

    let settings = WorkspaceSettings {
        dir,
        scheme: merged.scheme.clone(),
        path_version: merged.path_version,
        dry_run,
    };

    Ok(Workspace {
        settings,
        inspector,
        merged,
        verbose: cli.verbose,
    })
}

fn real_main(cli: Cli) -> anyhow::Result<()> {
    match &cli.cmd {
        Command::Develop(args) => cmd_develop(&cli, args),
        Command::Release(args) => cmd_release(&cli, args),
        Command::Push(args) => cmd_push(&cli, args),
        Command::Replace(args) => cmd_replace(&cli, args),
        Command::Imports(args) => cmd_imports(&cli, args),
        Command::Deps(args) => cmd_deps(&cli, args),
    }
}

fn print_patch(patch: &str) {
    if !patch.is_empty() {
        print!("{}", patch);
    }
}

fn cmd_develop(cli: &Cli, args: &DevelopArgs) -> anyhow::Result<()> {
    let ctx = prepare(cli, CliOverrides::default(), args.dry_run)?;
    let outcome = switch_to_development(&ctx.settings, &ctx.inspector)?;
    if args.dry_run {
        print_patch(&outcome.rewrite.patch);
    }
    Ok(())
}

fn cmd_release(cli: &Cli, args: &ReleaseArgs) -> anyhow::Result<()> {
    let release = ReleaseSettings::from_step(&args.step, ReleaseMode::RewriteOnly)?;
    let ctx = prepare(
        cli,
        CliOverrides {
            path_version: args.path_version.map(Into::into),
            ..Default::default()
        },
        args.dry_run,
    )?;

    let repo = GitCli::open(&ctx.settings.dir, ctx.merged.remote.clone())?.verbose(ctx.verbose);
    let installer = CommandInstaller::new(ctx.merged.install.clone(), ctx.settings.dir.clone());
    let outcome = cut_release(&ctx.settings, &release, &ctx.inspector, &repo, &installer)?;

    if args.dry_run {
        print_patch(&outcome.rewrite.patch);
    }
    println!("new version: {}", outcome.version);
    Ok(())
}

fn cmd_push(cli: &Cli, args: &PushArgs) -> anyhow::Result<()> {
    let release = ReleaseSettings::from_step(&args.step, ReleaseMode::Publish)?;
    let ctx = prepare(
        cli,
        CliOverrides {
            path_version: args.path_version.map(Into::into),
            remote: args.remote.clone(),
            ..Default::default()
        },
        false,
    )?;

    let repo = GitCli::open(&ctx.settings.dir, ctx.merged.remote.clone())?.verbose(ctx.verbose);
    let installer = CommandInstaller::new(ctx.merged.install.clone(), ctx.settings.dir.clone())
        .verbose(ctx.verbose);

    match cut_release(&ctx.settings, &release, &ctx.inspector, &repo, &installer) {
        Ok(outcome) => {
            if let Some(tag) = outcome.tag {
                println!("added tag: {}", tag);
            }
            Ok(())
        }
        Err(err) => {
            // The tag survives a failed install.
            if let ReleaseError::Install { tag, .. } = &err {
                println!("added tag: {}", tag);
            }
            Err(err.into())
        }
    }
}

fn cmd_replace(cli: &Cli, args: &ReplaceArgs) -> anyhow::Result<()> {
    let ctx = prepare(cli, CliOverrides::default(), args.dry_run)?;
    let outcome = replace_import(&ctx.settings, &ctx.inspector, &args.src, &args.target)?;
    if args.dry_run {
        print_patch(&outcome.rewrite.patch);
    }
    Ok(())
}

fn cmd_imports(cli: &Cli, args: &ListArgs) -> anyhow::Result<()> {
    let ctx = prepare(cli, CliOverrides::default(), false)?;
    let imports = list_imports(&ctx.settings, &ctx.inspector)?;
    match args.format {
        OutputFormat::Text => {
            for import in &imports {
                println!("{}", import);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&imports)?),
    }
    Ok(())
}

fn cmd_deps(cli: &Cli, args: &ListArgs) -> anyhow::Result<()> {
    let ctx = prepare(cli, CliOverrides::default(), false)?;
    let listing = list_dependents(&ctx.settings, &ctx.inspector)?;
    match args.format {
        OutputFormat::Text => {
            println!("{}", listing.package);
            for dep in &listing.dependents {
                println!("{}", dep);
            }
        }
        OutputFormat::Json => {
            let value = serde_json::json!({
                "package": listing.package,
                "dependents": listing.dependents,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}
