//! `apisync show <dir> -e <env>`

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use apisync_core::types::{ProjectParams, ProjectType};
use apisync_detector::Classifier;
use apisync_sync::{resolve_environment, EnvironmentOverride};

use crate::vcs;

/// Print the environment override a deploy of one project would use.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Project root directory.
    pub dir: PathBuf,

    /// Target environment.
    #[arg(long, short = 'e', value_name = "ENV")]
    pub env: String,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,

    /// Repository root, used for the project's relative path.
    #[arg(long, value_name = "DIR")]
    pub repo: Option<PathBuf>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShowJson<'a> {
    name: String,
    project_type: ProjectType,
    relative_path: &'a std::path::Path,
    environment: &'a str,
    /// Credentials stay out of the listing; only the scheme is shown.
    #[serde(skip_serializing_if = "Option::is_none")]
    security: Option<&'static str>,
    #[serde(rename = "override")]
    override_: Option<EnvironmentOverride>,
}

impl ShowArgs {
    pub fn run(self) -> Result<()> {
        let dir = self
            .dir
            .canonicalize()
            .with_context(|| format!("cannot resolve path '{}'", self.dir.display()))?;
        let root = match &self.repo {
            Some(repo) => repo
                .canonicalize()
                .with_context(|| format!("cannot resolve repository '{}'", repo.display()))?,
            None => vcs::toplevel(&dir).unwrap_or_else(|_| dir.clone()),
        };

        let mut classifier = Classifier::new(root);
        let Some(project) = classifier
            .classify(&dir)
            .with_context(|| format!("failed to classify '{}'", dir.display()))?
        else {
            bail!(
                "{} is not a project root (no {} found)",
                dir.display(),
                marker_list()
            );
        };

        let override_ = project
            .params
            .as_api()
            .and_then(|api| resolve_environment(api, &self.env))
            .map(|env| EnvironmentOverride::for_project(env, &project.base_path));

        if self.json {
            let mut override_ = override_;
            let security = override_
                .as_mut()
                .and_then(|ov| ov.security.take())
                .map(|security| security.label());
            let payload = ShowJson {
                name: project.name.to_string(),
                project_type: project.project_type(),
                relative_path: &project.relative_path,
                environment: &self.env,
                security,
                override_,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize JSON")?
            );
            return Ok(());
        }

        print_human(&project, &self.env, override_.as_ref());
        Ok(())
    }
}

fn marker_list() -> String {
    ProjectType::all()
        .iter()
        .map(|kind| kind.marker_file())
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_human(project: &ProjectParams, env: &str, found: Option<&EnvironmentOverride>) {
    println!(
        "{} {} ({})",
        project.project_type().to_string().bold(),
        project.name,
        project.relative_path.display()
    );
    if project.project_type() != ProjectType::Api {
        println!("  environment overrides only apply to api projects");
        return;
    }
    let Some(ov) = found else {
        println!("  no '{env}' environment declared; deploys use the project defaults");
        return;
    };

    println!("  environment:  {}", ov.name.green());
    println!("  endpoints:    {}", ov.endpoint_type);
    if let Some(strategy) = &ov.strategy {
        println!("  routing:      {}", strategy.label());
    }
    for url in ov.production_urls() {
        println!("  production:   {url}");
    }
    for url in ov.sandbox_urls() {
        println!("  sandbox:      {url}");
    }
    if let Some(security) = &ov.security {
        let label = if security.is_enabled() {
            security.label().yellow()
        } else {
            security.label().bright_black()
        };
        println!("  security:     {label}");
    }
    if let Some(gateways) = &ov.gateway_environments {
        println!("  gateways:     {}", gateways.join(", "));
    }
    if let Some(policies) = &ov.policies {
        println!("  policies:     {}", policies.join(", "));
    }
    for cert in &ov.certs {
        println!("  cert:         {} -> {}", cert.host_name, cert.path.display());
    }
    for cert in &ov.mutual_ssl_certs {
        println!("  mutual ssl:   {} -> {}", cert.tier_name, cert.path.display());
    }
}
