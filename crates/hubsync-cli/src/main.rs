//! hubsync - publish local project folders to GitHub
//!
//! Usage:
//!   hubsync connect             # Save an access token
//!   hubsync upload [PATH]       # Create the repository if needed and push
//!   hubsync update [PATH]       # Commit and push new work
//!   hubsync list                # Your repositories

mod output;
mod prompt;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hubsync_core::config::ConfigStore;
use hubsync_core::fs::scan_tree;
use hubsync_core::git::clone_repo;
use hubsync_core::git::remote::remote_url;
use hubsync_core::hosted::{CreateRepoRequest, HostedError, HostedRepos, RepoLookup, Repository};
use hubsync_core::prelude::*;

use crate::output::Printer;

#[derive(Parser)]
#[command(name = "hubsync")]
#[command(about = "Publish local project folders to GitHub", long_about = None)]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Access token (overrides the saved one)
    #[arg(long, global = true, env = "HUBSYNC_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check an access token and save it
    Connect {
        /// Token to save; prompted for when omitted
        #[arg(value_name = "TOKEN")]
        value: Option<String>,
    },

    /// Create a repository on the hosted service
    Create {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        private: bool,
        /// Seed the repository with a README
        #[arg(long)]
        init: bool,
    },

    /// Publish a folder, creating the repository when it does not exist
    Upload {
        /// Folder to publish (defaults to the last used folder)
        path: Option<PathBuf>,
        /// Repository name (defaults to the folder name)
        #[arg(short, long)]
        repo: Option<String>,
        #[arg(short, long)]
        branch: Option<String>,
        #[arg(short, long)]
        message: Option<String>,
        /// Create the repository as private
        #[arg(long)]
        private: bool,
        /// Skip the large file survey
        #[arg(long)]
        no_scan: bool,
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Commit and push new work from an existing working copy
    Update {
        path: Option<PathBuf>,
        /// Repository to push to (defaults to the configured remote)
        #[arg(short, long)]
        repo: Option<String>,
        #[arg(short, long)]
        branch: Option<String>,
        #[arg(short, long)]
        message: Option<String>,
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Clone a repository
    Clone {
        /// `name`, `owner/name` or a clone URL
        repo: String,
        dest: Option<PathBuf>,
    },

    /// Delete a repository on the hosted service
    Delete {
        name: String,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Show details of a repository
    Info {
        name: String,
        /// Also print the README
        #[arg(long)]
        readme: bool,
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// List your repositories
    List {
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Report files too large for a regular push
    Scan {
        path: Option<PathBuf>,
        /// Threshold in MiB (defaults to the configured one)
        #[arg(long)]
        threshold_mb: Option<u64>,
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
enum OutputFormat {
    /// Human-readable output
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "hubsync=debug,info"
    } else {
        "hubsync=info,warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(err) = run(cli).await {
        if let Some(hint) = hint(&err) {
            eprintln!("{} {hint}", console::style("hint:").yellow().bold());
        }
        return Err(err);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("failed to read the current directory")?;
    let store = ConfigStore::for_project(&cwd).context("failed to locate configuration")?;
    let mut printer = Printer::stdout();

    match cli.command {
        Commands::Connect { value } => run_connect(&store, value.or(cli.token)).await,
        Commands::Create {
            name,
            description,
            private,
            init,
        } => {
            let ctx = context(&store, cli.token)?;
            let mut request = CreateRepoRequest::new(&name);
            request.description = description;
            request.private = private;
            request.auto_init = init;
            let repo = ctx.hosted()?.create(request).await?;
            printer.created(&repo)
        }
        Commands::Upload {
            path,
            repo,
            branch,
            message,
            private,
            no_scan,
            format,
        } => {
            let folder = resolve_folder(&store, path)?;
            let ctx = context(&store.with_project_root(&folder), cli.token)?;
            let name = match repo {
                Some(name) => name,
                None => folder_name(&folder)?,
            };
            let hosted = ctx.hosted()?;
            let remote = find_or_create(hosted.as_ref(), &name, private).await?;

            let target = SyncTarget::new(&folder, remote.clone_url)
                .with_branch(branch.unwrap_or_default())
                .with_message(message.unwrap_or_default());
            let options = ctx.sync_options().with_scan(!no_scan);
            let report = sync(&ctx, target, options).await?;
            remember(&ctx, &folder);
            printer.report(&report, format)?;
            finish(&report)
        }
        Commands::Update {
            path,
            repo,
            branch,
            message,
            format,
        } => {
            let folder = resolve_folder(&store, path)?;
            let ctx = context(&store.with_project_root(&folder), cli.token)?;
            let url = match repo {
                Some(name) => ctx.hosted()?.get(&name).await.into_result(&name)?.clone_url,
                None => configured_remote(&ctx, &folder).await?,
            };

            let target = SyncTarget::new(&folder, url)
                .with_branch(branch.unwrap_or_default())
                .with_message(message.unwrap_or_default());
            let options = ctx.sync_options().with_mode(SyncMode::Update);
            let report = sync(&ctx, target, options).await?;
            remember(&ctx, &folder);
            printer.report(&report, format)?;
            finish(&report)
        }
        Commands::Clone { repo, dest } => {
            let ctx = context(&store, cli.token)?;
            let url = if looks_like_url(&repo) {
                repo.clone()
            } else {
                ctx.hosted()?.get(&repo).await.into_result(&repo)?.clone_url
            };
            let dest = match dest {
                Some(dest) => dest,
                None => cwd.join(repo_basename(&repo)),
            };
            let path = clone_repo(ctx.runner(), &url, &dest)
                .await
                .with_context(|| format!("failed to clone {url}"))?;
            printer.cloned(&path)
        }
        Commands::Delete { name, yes } => {
            let ctx = context(&store, cli.token)?;
            if !prompt::confirm_delete(&name, yes)? {
                println!("Deletion cancelled.");
                return Ok(());
            }
            ctx.hosted()?.delete(&name).await?;
            printer.deleted(&name)
        }
        Commands::Info {
            name,
            readme,
            format,
        } => {
            let ctx = context(&store, cli.token)?;
            let hosted = ctx.hosted()?;
            let repo = hosted.get(&name).await.into_result(&name)?;
            let topics = hosted.topics(&name).await?;
            let readme = if readme { hosted.readme(&name).await? } else { None };
            printer.info(&repo, &topics, readme.as_deref(), format)
        }
        Commands::List { format } => {
            let ctx = context(&store, cli.token)?;
            let repos = ctx.hosted()?.list().await?;
            printer.list(&repos, format)
        }
        Commands::Scan {
            path,
            threshold_mb,
            format,
        } => {
            let folder = resolve_folder(&store, path)?;
            let ctx = context(&store.with_project_root(&folder), cli.token)?;
            let threshold = match threshold_mb {
                Some(mb) => megabytes(mb)?,
                None => ctx.config().large_file_threshold_bytes,
            };
            let survey = tokio::task::spawn_blocking(move || scan_tree(&folder, threshold))
                .await
                .context("scan task failed")?;
            printer.survey(&survey, threshold, format)
        }
    }
}

fn megabytes(mb: u64) -> Result<u64> {
    match mb.checked_mul(1024 * 1024) {
        Some(bytes) => Ok(bytes),
        None => bail!("--threshold-mb {mb} is too large"),
    }
}

fn context(store: &ConfigStore, token: Option<String>) -> Result<AppContext> {
    let ctx = AppContext::from_store(store).context("failed to load configuration")?;
    Ok(match token {
        Some(token) => ctx.with_token(token),
        None => ctx,
    })
}

async fn run_connect(store: &ConfigStore, token: Option<String>) -> Result<()> {
    let token = match token {
        Some(token) => token,
        None => prompt::ask_token()?,
    };
    let ctx = context(store, Some(token))?;
    let Some(token) = ctx.token().map(str::to_string) else {
        bail!("no token given");
    };

    let login = ctx
        .hosted()?
        .authenticated_user()
        .await
        .context("the token was not accepted")?;
    store
        .save_token(&token)
        .context("failed to save the token")?;
    println!("Connected as {login}");
    Ok(())
}

/// Explicit path, else the last used folder, else the current directory.
fn resolve_folder(store: &ConfigStore, path: Option<PathBuf>) -> Result<PathBuf> {
    let folder = match path {
        Some(path) => path,
        None => store
            .load()
            .context("failed to load configuration")?
            .last_folder
            .unwrap_or_else(|| store.project_root().to_path_buf()),
    };
    std::fs::canonicalize(&folder)
        .with_context(|| format!("folder does not exist: {}", folder.display()))
}

fn folder_name(folder: &Path) -> Result<String> {
    folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("cannot derive a repository name from {}", folder.display()))
}

async fn find_or_create(hosted: &dyn HostedRepos, name: &str, private: bool) -> Result<Repository> {
    match hosted.get(name).await {
        RepoLookup::Found(repo) => Ok(repo),
        RepoLookup::NotFound => {
            let mut request = CreateRepoRequest::new(name);
            request.private = private;
            let repo = hosted.create(request).await?;
            tracing::info!(repo = %repo.full_name, "created repository");
            Ok(repo)
        }
        RepoLookup::Error(err) => Err(err).context("failed to look up the repository"),
    }
}

async fn configured_remote(ctx: &AppContext, folder: &Path) -> Result<String> {
    let name = &ctx.config().remote_name;
    match remote_url(ctx.runner(), folder, name).await? {
        Some(url) => Ok(url),
        None => bail!("no '{name}' remote is configured; pass --repo"),
    }
}

async fn sync(ctx: &AppContext, target: SyncTarget, options: SyncOptions) -> Result<SyncReport> {
    let handle = ctx.sync_engine().spawn(target, options)?;
    let report = handle.await.context("sync task failed")??;
    Ok(report)
}

/// Non-zero exit for outcomes that left the remote behind.
fn finish(report: &SyncReport) -> Result<()> {
    if report.outcome.is_success() {
        return Ok(());
    }
    if report.committed {
        bail!("push did not complete ({}); the local commit is kept", report.outcome);
    }
    bail!("push did not complete ({})", report.outcome)
}

fn remember(ctx: &AppContext, folder: &Path) {
    if let Err(err) = ctx.remember_folder(folder.to_path_buf()) {
        tracing::warn!(error = %err, "failed to remember the folder");
    }
}

fn looks_like_url(repo: &str) -> bool {
    repo.contains("://") || repo.starts_with("git@") || repo.ends_with(".git")
}

fn repo_basename(repo: &str) -> String {
    let last = repo
        .trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(repo);
    last.trim_end_matches(".git").to_string()
}

/// Hint for a failure from the core, if it has one.
fn hint(err: &anyhow::Error) -> Option<&'static str> {
    if let Some(err) = err.downcast_ref::<SyncError>() {
        return err.suggestion();
    }
    err.downcast_ref::<HostedError>()
        .and_then(|err| SyncError::from(err.clone()).suggestion())
}
