//! `devdir stats` — render the persisted reward statistics snapshot.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use devdir_core::config;
use devdir_core::types::Statistics;
use devdir_github::FileSnapshotStore;
use devdir_sync::{SnapshotKind, SnapshotStore};

/// Arguments for `devdir stats`.
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Path to the YAML config (defaults to `~/.devdir/config.yaml`).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "bucket")]
    bucket: String,
    #[tabled(rename = "rewards (USD)")]
    rewards: String,
    #[tabled(rename = "tasks")]
    tasks: u64,
}

impl StatsArgs {
    pub fn run(self) -> Result<()> {
        let path = match self.config {
            Some(path) => path,
            None => config::default_path()?,
        };
        let file_cfg = config::load_at(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?;

        let store = FileSnapshotStore::new(file_cfg.snapshot_dir);
        let value = store
            .load(SnapshotKind::Statistics)?
            .context("no statistics snapshot yet, run `devdir run` first")?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&value)?);
            return Ok(());
        }

        let stats: Statistics =
            serde_json::from_value(value).context("statistics snapshot is malformed")?;
        print_table(&stats);
        Ok(())
    }
}

fn print_table(stats: &Statistics) {
    println!("{}", "Directory statistics".bold());
    let rows = vec![
        StatRow {
            bucket: "not assigned".to_string(),
            rewards: format!("{:.2}", stats.rewards.not_assigned),
            tasks: stats.tasks.not_assigned,
        },
        StatRow {
            bucket: "assigned".to_string(),
            rewards: format!("{:.2}", stats.rewards.assigned),
            tasks: stats.tasks.assigned,
        },
        StatRow {
            bucket: "completed".to_string(),
            rewards: format!("{:.2}", stats.rewards.completed),
            tasks: stats.tasks.completed,
        },
        StatRow {
            bucket: "total".to_string(),
            rewards: format!("{:.2}", stats.rewards.total),
            tasks: stats.tasks.total,
        },
    ];
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}
