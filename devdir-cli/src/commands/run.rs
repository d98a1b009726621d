//! `devdir run` — one full reconciliation pass.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use devdir_core::config;
use devdir_core::types::RepoSlug;
use devdir_github::{FileSnapshotStore, GithubClient};
use devdir_social::HttpFeed;
use devdir_sync::{pipeline, NullFeed, RunSummary, SocialFeed};

/// Arguments for `devdir run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the YAML config (defaults to `~/.devdir/config.yaml`).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log would-be mutations without issuing any remote writes.
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let path = match self.config {
            Some(path) => path,
            None => config::default_path()?,
        };
        let file_cfg = config::load_at(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?;

        let token = std::env::var("GITHUB_TOKEN")
            .context("GITHUB_TOKEN is not set; a token with repo scope is required")?;
        let client = GithubClient::new(token);

        // Fork detection needs one remote lookup before the config is final.
        let directory: RepoSlug = file_cfg.directory.parse()?;
        let info = client
            .fetch_repo(&directory)
            .with_context(|| format!("failed to inspect directory repository {directory}"))?;
        let run_cfg = file_cfg.into_run_config(info.fork, info.parent, self.dry_run)?;

        let snapshots = FileSnapshotStore::new(run_cfg.snapshot_dir.clone());
        let feed = HttpFeed::from_env();
        let null_feed = NullFeed;
        let social: &dyn SocialFeed = match &feed {
            Some(feed) => feed,
            None => &null_feed,
        };

        let ctx = pipeline::RunContext {
            config: &run_cfg,
            host: &client,
            social,
            snapshots: &snapshots,
        };
        let summary = pipeline::run(&ctx).context("reconciliation run failed")?;
        print_summary(&summary, run_cfg.dry_run);

        if !summary.failures.is_empty() {
            anyhow::bail!("{} operation(s) failed, see output above", summary.failures.len());
        }
        Ok(())
    }
}

fn print_summary(summary: &RunSummary, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    println!(
        "{prefix}✓ reconciled {} partner repositories",
        summary.repos_processed
    );
    println!(
        "  {} created, {} metadata updates, {} state transitions, {} label changes, {} force-closed",
        summary.created,
        summary.metadata_updates,
        summary.state_transitions,
        summary.label_mutations,
        summary.force_closed,
    );
    println!(
        "  rewards: {} USD across {} open tasks ({} USD total)",
        summary.statistics.rewards.not_assigned,
        summary.statistics.tasks.not_assigned,
        summary.statistics.rewards.total,
    );
    for failure in &summary.failures {
        println!("  {} {}: {}", "✗".red(), failure.context, failure.message);
    }
}
