//! `apisync status`: what the next deploy would touch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use apisync_core::{config, types::ProjectType};
use apisync_detector::{ChangeSet, Origin};
use apisync_sync::pipeline::{self, Target};

use super::{collect_changes, RepoArgs};

/// Arguments for `apisync status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Target environment.
    #[arg(long, short = 'e', value_name = "ENV")]
    pub env: String,

    /// Read changed paths from a file (`-` for stdin) instead of git.
    #[arg(long, value_name = "FILE")]
    pub changed_from: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub repo: RepoArgs,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusJson {
    environment: String,
    previously_failed: usize,
    projects: Vec<PendingJson>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PendingJson {
    name: String,
    project_type: ProjectType,
    relative_path: PathBuf,
    origin: Origin,
}

#[derive(Tabled)]
struct PendingRow {
    #[tabled(rename = "project")]
    name: String,
    #[tabled(rename = "path")]
    path: String,
    #[tabled(rename = "reason")]
    reason: String,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let home = config::home()?;
        let root = self.repo.root()?;
        let target = Target {
            home: &home,
            repo_root: &root,
            environment: &self.env,
        };

        let changes = collect_changes(target, self.changed_from.as_deref())?;
        let plan = pipeline::plan(target, &changes.paths)
            .with_context(|| format!("failed to resolve changes in '{}'", root.display()))?;

        if self.json {
            print_json(&self.env, &plan.change_set, plan.requeued)?;
        } else {
            print_table(&self.env, &plan.change_set, plan.requeued);
        }
        Ok(())
    }
}

fn print_json(env: &str, set: &ChangeSet, requeued: usize) -> Result<()> {
    let payload = StatusJson {
        environment: env.to_string(),
        previously_failed: requeued,
        projects: set
            .entries()
            .map(|entry| PendingJson {
                name: entry.project.name.to_string(),
                project_type: entry.project.project_type(),
                relative_path: entry.project.relative_path.clone(),
                origin: entry.origin,
            })
            .collect(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(env: &str, set: &ChangeSet, requeued: usize) {
    println!(
        "apisync v{} | environment '{}' | {} project(s) | {} previously failed",
        env!("CARGO_PKG_VERSION"),
        env,
        set.len(),
        requeued,
    );
    if set.is_empty() {
        println!("Nothing to deploy.");
        return;
    }

    for (kind, entries) in set.groups() {
        println!("{}", kind.plural().to_uppercase().bold());
        let rows: Vec<PendingRow> = entries
            .iter()
            .map(|entry| PendingRow {
                name: entry.project.name.to_string(),
                path: entry.project.relative_path.display().to_string(),
                reason: match entry.origin {
                    Origin::Diff => "changed".to_string(),
                    Origin::PreviouslyFailed => "previously failed".yellow().to_string(),
                },
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }
    println!("Run 'apisync deploy -e {env}' to deploy them.");
}
