//! Thin wrappers over the `git` executable.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};

fn git(dir: &Path, args: &[&str]) -> Result<String> {
    // Paths are printed verbatim: quoting would turn `café` into "caf\303\251".
    let output = Command::new("git")
        .args(["-c", "core.quotePath=false"])
        .args(args)
        .current_dir(dir)
        .output()
        .context("failed to run git; is it installed?")?;
    if !output.status.success() {
        bail!(
            "git {} failed in {}: {}",
            args.join(" "),
            dir.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Top-level directory of the work tree containing `dir`.
pub fn toplevel(dir: &Path) -> Result<PathBuf> {
    let out = git(dir, &["rev-parse", "--show-toplevel"])?;
    Ok(PathBuf::from(out.trim()))
}

pub fn head(repo_root: &Path) -> Result<String> {
    Ok(git(repo_root, &["rev-parse", "HEAD"])?.trim().to_string())
}

/// Files changed since `since`, or every tracked file when nothing has been
/// deployed yet. Deleted files are left out.
pub fn changed_paths(repo_root: &Path, since: Option<&str>) -> Result<Vec<PathBuf>> {
    let out = match since {
        Some(rev) => git(repo_root, &["diff", "-z", "--name-only", "--diff-filter=d", rev])?,
        None => git(repo_root, &["ls-tree", "-z", "-r", "HEAD", "--name-only", "--full-tree"])?,
    };
    Ok(split_nul(&out))
}

/// Split `-z` output. Names may contain newlines, so only NUL separates them.
fn split_nul(out: &str) -> Vec<PathBuf> {
    out.split('\0')
        .filter(|name| !name.is_empty())
        .map(PathBuf::from)
        .collect()
}
