//! Subcommands and the pieces they share.

pub mod deploy;
pub mod init;
pub mod show;
pub mod status;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use apisync_detector::parse_changed_paths;
use apisync_sync::{pipeline, CancelFlag};

use crate::vcs;

/// Which repository a command works on.
#[derive(Args, Debug)]
pub struct RepoArgs {
    /// Repository root. Defaults to the git work tree around the current directory.
    #[arg(long, value_name = "DIR")]
    pub repo: Option<PathBuf>,
}

impl RepoArgs {
    pub fn root(&self) -> Result<PathBuf> {
        match &self.repo {
            Some(dir) => dir
                .canonicalize()
                .with_context(|| format!("cannot resolve repository '{}'", dir.display())),
            None => {
                let cwd = std::env::current_dir().context("cannot read current directory")?;
                vcs::toplevel(&cwd).context("not inside a git repository; pass --repo")
            }
        }
    }
}

/// Changed paths for a run and whether they came from git.
pub struct Changes {
    pub paths: Vec<PathBuf>,
    pub from_git: bool,
}

/// Read changed paths from `changed_from` (`-` is stdin) or ask git for the
/// files changed since the last recorded run of this environment.
pub fn collect_changes(
    target: pipeline::Target<'_>,
    changed_from: Option<&Path>,
) -> Result<Changes> {
    if let Some(source) = changed_from {
        let text = if source == Path::new("-") {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read changed paths from stdin")?;
            buf
        } else {
            std::fs::read_to_string(source)
                .with_context(|| format!("failed to read changed paths from {}", source.display()))?
        };
        return Ok(Changes {
            paths: parse_changed_paths(&text),
            from_git: false,
        });
    }

    let since = pipeline::since_revision(target)?;
    match &since {
        Some(rev) => tracing::info!("collecting changes since {}", rev),
        None => tracing::info!(
            "no previous run for '{}'; considering every tracked file",
            target.environment
        ),
    }
    Ok(Changes {
        paths: vcs::changed_paths(target.repo_root, since.as_deref())?,
        from_git: true,
    })
}

/// Set `cancel` on the first ctrl-c and exit on the second. The signal is
/// awaited on a small runtime owned by a background thread; running
/// deployments finish and the remaining projects are reported as cancelled.
pub fn cancel_on_ctrl_c(cancel: CancelFlag) {
    let spawned = std::thread::Builder::new()
        .name("ctrl-c".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    tracing::warn!("cannot install ctrl-c handler: {}", e);
                    return;
                }
            };
            runtime.block_on(async {
                if let Err(err) = tokio::signal::ctrl_c().await {
                    tracing::warn!("ctrl-c handler failed: {}", err);
                    return;
                }
                tracing::warn!("received ctrl-c; finishing running deployments");
                cancel.cancel();
                if tokio::signal::ctrl_c().await.is_ok() {
                    std::process::exit(130);
                }
            });
        });
    if let Err(e) = spawned {
        tracing::warn!("cannot install ctrl-c handler: {}", e);
    }
}
