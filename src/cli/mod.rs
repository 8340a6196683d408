pub mod common;
pub mod parser;
pub mod reader;

pub use common::*;
pub use parser::{parse_export_config, parse_sync_config, ExportConfig, SyncConfig};

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use log::info;

use crate::{
    export::Exporter,
    github_provider::GithubProvider,
    provider::{IssueReporter, ReleaseSource, ReleaseTarget},
    report,
    sync::{self, Migrator, RunSummary},
};
use reader::{read_config_file, FileConfig};

#[derive(Parser)]
#[clap(name = "migrate-releases", version, about = "Migrate GitHub releases between repositories")]
pub struct Args {
    /// YAML file with default values for any flag
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Creates a JSON file for each release of a repository
    Export(ExportArgs),
    /// Recreates releases and their assets from a source organization in a target organization
    Sync(SyncArgs),
}

#[derive(ClapArgs, Clone, Debug)]
pub struct ExportArgs {
    /// Organization of the repository
    #[clap(short, long, env = "GHMT_SOURCE_ORGANIZATION")]
    pub organization: Option<String>,

    /// GitHub token
    #[clap(short, long, env = "GHMT_SOURCE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Repository to export
    #[clap(short, long, env = "GHMT_REPOSITORY")]
    pub repository: Option<String>,

    /// Output filenames prefix
    #[clap(short, long, env = "GHMT_OUTPUT_FILE")]
    pub file_prefix: Option<String>,

    /// GitHub Enterprise hostname, e.g. github.example.com
    #[clap(short = 'u', long, env = "GHMT_SOURCE_HOSTNAME")]
    pub hostname: Option<String>,

    /// Directory receiving the JSON files and archives
    #[clap(long)]
    pub output_dir: Option<PathBuf>,

    /// Also download the zip and tarball source archives of every release
    #[clap(long)]
    pub archives: bool,

    /// Per-request timeout in seconds
    #[clap(long)]
    pub timeout: Option<u64>,

    /// Longest rate limit reset to wait for, in seconds
    #[clap(long)]
    pub max_rate_limit_wait: Option<u64>,
}

#[derive(ClapArgs, Clone, Debug)]
pub struct SyncArgs {
    /// Source organization to sync releases from
    #[clap(short, long, env = "GHMT_SOURCE_ORGANIZATION")]
    pub source_organization: Option<String>,

    /// Target organization to sync releases to
    #[clap(short, long, env = "GHMT_TARGET_ORGANIZATION")]
    pub target_organization: Option<String>,

    /// Source organization GitHub token
    #[clap(short = 'a', long, env = "GHMT_SOURCE_TOKEN", hide_env_values = true)]
    pub source_token: Option<String>,

    /// Target organization GitHub token
    #[clap(short = 'b', long, env = "GHMT_TARGET_TOKEN", hide_env_values = true)]
    pub target_token: Option<String>,

    /// GitHub Enterprise source hostname, e.g. https://github.example.com
    #[clap(short = 'u', long, env = "GHMT_SOURCE_HOSTNAME")]
    pub source_hostname: Option<String>,

    /// GitHub Enterprise target hostname, github.com when unset
    #[clap(long, env = "GHMT_TARGET_HOSTNAME")]
    pub target_hostname: Option<String>,

    /// Repository to migrate, `name` or `owner/name`
    #[clap(short, long, env = "GHMT_REPOSITORY")]
    pub repository: Option<String>,

    /// File with one repository (name, owner/name or URL) per line
    #[clap(short = 'l', long, env = "GHMT_REPOSITORY_LIST")]
    pub repository_list: Option<PathBuf>,

    /// CSV file mapping source handles to target handles
    #[clap(short, long, env = "GHMT_MAPPING_FILE")]
    pub mapping_file: Option<PathBuf>,

    /// Directory holding the asset being relayed
    #[clap(long)]
    pub temp_dir: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[clap(long)]
    pub timeout: Option<u64>,

    /// Longest rate limit reset to wait for, in seconds
    #[clap(long)]
    pub max_rate_limit_wait: Option<u64>,
}

pub async fn run() -> Result<()> {
    let args = Args::parse();

    let file_config = match &args.config {
        Some(path) => read_config_file(path)?,
        None => FileConfig::default(),
    };

    match &args.command {
        Command::Export(export_args) => {
            let config = parse_export_config(export_args, file_config)?;
            run_export(&config).await
        }
        Command::Sync(sync_args) => {
            let config = parse_sync_config(sync_args, file_config)?;
            run_sync(&config).await.map(|_| ())
        }
    }
}

async fn run_export(config: &ExportConfig) -> Result<()> {
    let target = RepositoryTarget::resolve(&config.repository, config.source.organization.as_deref())?;
    let source = GithubProvider::from_endpoint(&config.source, &config.network)
        .context("could not create source client")?;

    let summary = Exporter::new(&source, config)
        .run(&target)
        .await
        .with_context(|| format!("could not export releases of {}", target))?;

    info!(
        "Exported {} releases ({} archives downloaded, {} failed)",
        summary.files.len(),
        summary.archives.len(),
        summary.archive_failures
    );

    Ok(())
}

pub async fn run_sync(config: &SyncConfig) -> Result<RunSummary> {
    let source = GithubProvider::from_endpoint(&config.source, &config.network)
        .context("could not create source client")?;
    let target = GithubProvider::from_endpoint(&config.target, &config.network)
        .context("could not create target client")?;

    sync_releases(config, &source, &target, &report::process_env).await
}

/// Failed releases are reported in the summary; only configuration problems are errors.
pub async fn sync_releases<S, T>(
    config: &SyncConfig,
    source: &S,
    target: &T,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<RunSummary>
where
    S: ReleaseSource,
    T: ReleaseTarget + IssueReporter,
{
    let targets = sync::resolve_targets(config).await?;

    let summary = Migrator::new(source, target, config).run(&targets).await;

    report::publish(&summary, target, lookup).await;

    Ok(summary)
}
