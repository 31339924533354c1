//! `apisync init [--force] [--repo <dir>]`

use anyhow::{Context, Result};
use clap::Args;

use apisync_core::config;
use apisync_sync::repo_info;

use super::RepoArgs;

/// Give a repository its id and create the tool config if it is missing.
#[derive(Args, Debug)]
pub struct InitArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Replace an existing `vcs.yaml` with a fresh id.
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let root = self.repo.root()?;
        let info = repo_info::init(&root, self.force)
            .with_context(|| format!("failed to initialise '{}'", root.display()))?;
        println!("✓ Initialised '{}' (id {})", root.display(), info.id);
        println!("  Saved to: {}", repo_info::repo_info_path(&root).display());

        let home = config::home()?;
        if !config::config_path_at(&home).exists() {
            let path = config::save_config_at(&home, &config::Config::default())
                .context("failed to write default config")?;
            println!("  Created config: {}", path.display());
        }
        Ok(())
    }
}
