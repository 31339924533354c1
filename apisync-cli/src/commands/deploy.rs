//! `apisync deploy`: push every changed project to an environment.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use apisync_core::{config, types::ProjectType};
use apisync_detector::Origin;
use apisync_sync::{
    pipeline::{self, Target},
    CommandDeployer, Deployer, DryRunDeployer, ProjectOutcome, SyncOptions, SyncReport,
};

use super::{cancel_on_ctrl_c, collect_changes, RepoArgs};
use crate::vcs;

/// Arguments for `apisync deploy`.
#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Target environment.
    #[arg(long, short = 'e', value_name = "ENV")]
    pub env: String,

    /// Resolve and report without running any deploy command or recording state.
    #[arg(long)]
    pub dry_run: bool,

    /// Concurrent deployments. Defaults to `deploy.jobs` from the config.
    #[arg(long, short = 'j', value_name = "N")]
    pub jobs: Option<usize>,

    /// Read changed paths from a file (`-` for stdin) instead of git.
    #[arg(long, value_name = "FILE")]
    pub changed_from: Option<PathBuf>,

    /// Emit the run report as JSON.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub repo: RepoArgs,
}

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "type")]
    kind: String,
    #[tabled(rename = "project")]
    name: String,
    #[tabled(rename = "path")]
    path: String,
    #[tabled(rename = "result")]
    result: String,
}

impl DeployArgs {
    pub fn run(self) -> Result<()> {
        let home = config::home()?;
        let cfg = config::load_config_at(&home).context("failed to load apisync config")?;
        let root = self.repo.root()?;
        let target = Target {
            home: &home,
            repo_root: &root,
            environment: &self.env,
        };

        let deployer: Box<dyn Deployer> = if self.dry_run {
            let commands = &cfg.deploy.commands;
            let types = ProjectType::all()
                .iter()
                .copied()
                .filter(|kind| *kind == ProjectType::Api || commands.for_type(*kind).is_some());
            Box::new(DryRunDeployer::for_types(types))
        } else {
            if cfg.deploy.commands.api.is_none() {
                bail!(
                    "no deploy command configured for api projects; \
                     set deploy.commands.api in {} or use --dry-run",
                    config::config_path_at(&home).display()
                );
            }
            Box::new(CommandDeployer::from_config(&cfg.deploy))
        };

        let changes = collect_changes(target, self.changed_from.as_deref())?;
        // Only a git-derived run can be recorded against HEAD: an explicit
        // path list says nothing about which revision it covers.
        let head = if self.dry_run || !changes.from_git {
            None
        } else {
            Some(vcs::head(&root)?)
        };

        let options = SyncOptions {
            jobs: self.jobs.unwrap_or(cfg.deploy.jobs).max(1),
            ..SyncOptions::default()
        };
        cancel_on_ctrl_c(options.cancel.clone());

        let report = pipeline::run(
            target,
            &changes.paths,
            head.as_deref(),
            &*deployer,
            &options,
        )
        .with_context(|| format!("deploy to '{}' failed", self.env))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report)
                    .context("failed to serialize deploy report")?
            );
        } else {
            print_report(&report, self.dry_run);
        }

        if !report.is_success() {
            std::process::exit(1);
        }
        Ok(())
    }
}

fn print_report(report: &SyncReport, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    if report.nothing_to_do() {
        println!("{prefix}✓ '{}' — nothing to deploy", report.environment);
        return;
    }

    let rows: Vec<OutcomeRow> = report
        .projects
        .iter()
        .map(|p| OutcomeRow {
            kind: p.project_type.to_string(),
            name: p.name.clone(),
            path: match p.origin {
                Origin::Diff => p.relative_path.display().to_string(),
                Origin::PreviouslyFailed => format!("{} (retry)", p.relative_path.display()),
            },
            result: outcome_label(&p.outcome, dry_run),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    let summary = format!(
        "{prefix}'{}': {} deployed, {} failed, {} unsupported, {} cancelled",
        report.environment,
        report.succeeded(),
        report.failed(),
        report.unsupported(),
        report.cancelled(),
    );
    if report.is_success() {
        println!("{} {}", "✓".green().bold(), summary);
    } else {
        println!("{} {}", "✗".red().bold(), summary);
    }

    for p in &report.projects {
        if let ProjectOutcome::Failed { error } = &p.outcome {
            println!("  {} {}: {}", "✗".red(), p.relative_path.display(), error);
        }
    }
}

fn outcome_label(outcome: &ProjectOutcome, dry_run: bool) -> String {
    match outcome {
        ProjectOutcome::Deployed if dry_run => "would deploy".green().to_string(),
        ProjectOutcome::Deployed => "deployed".green().to_string(),
        ProjectOutcome::Failed { .. } => "failed".red().bold().to_string(),
        ProjectOutcome::Unsupported => "unsupported".bright_black().to_string(),
        ProjectOutcome::Cancelled => "cancelled".yellow().to_string(),
    }
}
