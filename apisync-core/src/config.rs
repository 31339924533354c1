//! Tool configuration in `~/.apisync/config.yaml`.
//!
//! # Storage layout
//!
//! ```text
//! ~/.apisync/                 (mode 0700)
//!   config.yaml               (mode 0600, optional)
//!   vcs_state.yaml            (mode 0600, written by deploys)
//! ```
//!
//! ```yaml
//! deploy:
//!   jobs: 4
//!   timeoutSecs: 120
//!   commands:
//!     api:
//!       program: ./scripts/push-api.sh
//!       args: ["{path}", "--env", "{env}"]
//! ```
//!
//! # API pattern
//!
//! Every function takes the home directory explicitly (`fn_at(home, …)`) so
//! tests can point it at a `TempDir`. Callers resolve the real one once with
//! [`home`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::ProjectType;

pub const DEFAULT_JOBS: usize = 1;
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

// ---------------------------------------------------------------------------
// 1. Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub deploy: DeployConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeployConfig {
    pub jobs: usize,
    pub timeout_secs: u64,
    pub commands: DeployCommands,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            jobs: DEFAULT_JOBS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            commands: DeployCommands::default(),
        }
    }
}

/// External deploy commands, one per project type. A type without a command
/// cannot be deployed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeployCommands {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api: Option<CommandSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_product: Option<CommandSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application: Option<CommandSpec>,
}

impl DeployCommands {
    pub fn for_type(&self, kind: ProjectType) -> Option<&CommandSpec> {
        match kind {
            ProjectType::Api => self.api.as_ref(),
            ProjectType::ApiProduct => self.api_product.as_ref(),
            ProjectType::Application => self.application.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

// ---------------------------------------------------------------------------
// 2. Paths
// ---------------------------------------------------------------------------

/// `<home>/.apisync/`, created with mode `0700` if absent.
pub fn apisync_dir_at(home: &Path) -> Result<PathBuf, ConfigError> {
    let dir = home.join(".apisync");
    ensure_private_dir(&dir).map_err(|source| ConfigError::Io {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}

/// `<home>/.apisync/config.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".apisync").join("config.yaml")
}

// ---------------------------------------------------------------------------
// 3. Load / save
// ---------------------------------------------------------------------------

/// Load the config, falling back to defaults when the file does not exist.
pub fn load_config_at(home: &Path) -> Result<Config, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
}

/// Atomically write the config (tmp sibling, `chmod 0600`, rename).
pub fn save_config_at(home: &Path, config: &Config) -> Result<PathBuf, ConfigError> {
    apisync_dir_at(home)?;
    let path = config_path_at(home);
    let yaml = serde_yaml::to_string(config)?;
    write_atomic(&path, &yaml).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

// ---------------------------------------------------------------------------
// Shared file helpers
// ---------------------------------------------------------------------------

/// The user's home directory, from `dirs::home_dir()`.
pub fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

/// Write `contents` to `path` through a `.tmp` sibling in the same directory,
/// so readers never see a half-written file.
pub fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);
    std::fs::write(&tmp_path, contents)?;
    set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, path)
}

/// Create `dir` (and parents) with mode `0700` if it does not exist.
pub fn ensure_private_dir(dir: &Path) -> std::io::Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
        set_dir_permissions(dir)?;
    }
    Ok(())
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
