//! The deployment collaborator seam and its two implementations.
//!
//! A [`Deployer`] receives one project at a time. It never sees the rest of
//! the run and must not assume any ordering between projects.

use std::collections::BTreeSet;
use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use apisync_core::config::{DeployCommands, DeployConfig};
use apisync_core::types::{ProjectParams, ProjectType};
use serde::Serialize;
use tracing::{debug, info};

use crate::environment::EnvironmentOverride;
use crate::error::DeployError;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Everything a deployer needs for one project.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest<'a> {
    pub project: &'a ProjectParams,
    /// Target environment name, whether or not the project declares it.
    pub environment: &'a str,
    /// The matching environment override, for API projects that declare one.
    #[serde(rename = "override")]
    pub override_: Option<EnvironmentOverride>,
}

/// Pushes a project to the remote management service.
pub trait Deployer: Send + Sync {
    /// Whether this deployer can handle `kind` at all.
    fn supports(&self, kind: ProjectType) -> bool {
        kind == ProjectType::Api
    }

    fn deploy(&self, request: &DeployRequest<'_>) -> Result<(), DeployError>;
}

// ---------------------------------------------------------------------------
// Dry run
// ---------------------------------------------------------------------------

/// Logs what would be deployed and always succeeds.
#[derive(Debug, Clone)]
pub struct DryRunDeployer {
    types: BTreeSet<ProjectType>,
}

impl DryRunDeployer {
    /// Accepts API projects only, like a real deployer with no extra setup.
    pub fn new() -> Self {
        Self::for_types([ProjectType::Api])
    }

    pub fn for_types(types: impl IntoIterator<Item = ProjectType>) -> Self {
        Self {
            types: types.into_iter().collect(),
        }
    }
}

impl Default for DryRunDeployer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deployer for DryRunDeployer {
    fn supports(&self, kind: ProjectType) -> bool {
        self.types.contains(&kind)
    }

    fn deploy(&self, request: &DeployRequest<'_>) -> Result<(), DeployError> {
        info!(
            "[dry-run] would deploy {} {} to {}",
            request.project.project_type(),
            request.project.relative_path.display(),
            request.environment
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// External command
// ---------------------------------------------------------------------------

/// Runs a configured program per project type.
///
/// Arguments may contain `{path}` (absolute project root), `{env}`, `{name}`
/// and `{type}`. The [`DeployRequest`] is written to the child's stdin as
/// JSON. The child is killed once the timeout elapses.
#[derive(Debug, Clone)]
pub struct CommandDeployer {
    commands: DeployCommands,
    timeout: Duration,
}

impl CommandDeployer {
    pub fn from_config(config: &DeployConfig) -> Self {
        Self {
            commands: config.commands.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Deployer for CommandDeployer {
    fn supports(&self, kind: ProjectType) -> bool {
        self.commands.for_type(kind).is_some()
    }

    fn deploy(&self, request: &DeployRequest<'_>) -> Result<(), DeployError> {
        let kind = request.project.project_type();
        let spec = self
            .commands
            .for_type(kind)
            .ok_or_else(|| DeployError::Rejected(format!("no deploy command for {kind} projects")))?;
        let program = spec.program.clone();
        let args: Vec<String> = spec.args.iter().map(|a| expand(a, request)).collect();
        let payload = serde_json::to_vec(request)?;

        debug!("running {} {}", program, args.join(" "));
        let mut child = Command::new(&program)
            .args(&args)
            .current_dir(&request.project.base_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| DeployError::Spawn {
                program: program.clone(),
                source,
            })?;

        // Pipes are serviced on their own threads so the timeout below holds
        // even when the child neither reads its input nor drains its output.
        let writer = child
            .stdin
            .take()
            .map(|mut stdin| thread::spawn(move || stdin.write_all(&payload)));
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = wait_with_timeout(&mut child, self.timeout).map_err(|source| {
            DeployError::Io {
                program: program.clone(),
                source,
            }
        })?;
        // On timeout the pipe threads are left detached; a surviving
        // grandchild may still hold the pipes open.
        let Some(status) = status else {
            return Err(DeployError::TimedOut {
                program,
                secs: self.timeout.as_secs(),
            });
        };
        if let Some(Ok(Err(e))) = writer.map(thread::JoinHandle::join) {
            // A child may exit without reading its input.
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                debug!("could not write request to {}: {}", program, e);
            }
        }
        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        if !stdout.trim().is_empty() {
            debug!("{}: {}", program, stdout.trim());
        }
        if status.success() {
            Ok(())
        } else {
            Err(DeployError::Failed {
                program,
                status: status.to_string(),
                stderr,
            })
        }
    }
}

fn expand(arg: &str, request: &DeployRequest<'_>) -> String {
    arg.replace("{path}", &request.project.base_path.to_string_lossy())
        .replace("{env}", request.environment)
        .replace("{name}", &request.project.name.0)
        .replace("{type}", &request.project.project_type().to_string())
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// `Ok(None)` when the child had to be killed.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            child.kill()?;
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use apisync_core::config::CommandSpec;
    use apisync_core::params::{ApiParams, ApiProductParams};
    use apisync_core::types::{ParamSet, ProjectName};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn project(root: &std::path::Path) -> ProjectParams {
        ProjectParams {
            name: ProjectName::from("orders"),
            base_path: root.to_path_buf(),
            relative_path: PathBuf::from("apis/orders"),
            params: ParamSet::Api(ApiParams::default()),
        }
    }

    fn sh(script: &str) -> CommandSpec {
        CommandSpec {
            program: "sh".into(),
            args: vec!["-c".into(), script.into()],
        }
    }

    fn deployer(api: CommandSpec) -> CommandDeployer {
        CommandDeployer::from_config(&DeployConfig {
            commands: DeployCommands {
                api: Some(api),
                ..DeployCommands::default()
            },
            ..DeployConfig::default()
        })
    }

    #[test]
    fn default_support_is_api_only() {
        struct Noop;
        impl Deployer for Noop {
            fn deploy(&self, _: &DeployRequest<'_>) -> Result<(), DeployError> {
                Ok(())
            }
        }
        assert!(Noop.supports(ProjectType::Api));
        assert!(!Noop.supports(ProjectType::ApiProduct));
        assert!(!Noop.supports(ProjectType::Application));
    }

    #[test]
    fn placeholders_are_expanded() {
        let root = TempDir::new().unwrap();
        let p = project(root.path());
        let req = DeployRequest { project: &p, environment: "dev", override_: None };
        assert_eq!(expand("{type}:{name}@{env}", &req), "api:orders@dev");
        assert_eq!(expand("{path}", &req), root.path().to_string_lossy());
    }

    #[cfg(unix)]
    #[test]
    fn command_receives_request_on_stdin() {
        let root = TempDir::new().unwrap();
        let out = root.path().join("payload.json");
        let p = project(root.path());
        let d = deployer(sh(&format!("cat > '{}'", out.display())));

        d.deploy(&DeployRequest { project: &p, environment: "dev", override_: None })
            .expect("deploy");

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(json["environment"], "dev");
        assert_eq!(json["project"]["name"], "orders");
        assert_eq!(json["project"]["params"]["type"], "api");
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_failure_with_stderr() {
        let root = TempDir::new().unwrap();
        let p = project(root.path());
        let d = deployer(sh("echo 'gateway said no' >&2; exit 3"));
        let err = d
            .deploy(&DeployRequest { project: &p, environment: "dev", override_: None })
            .unwrap_err();
        assert!(matches!(err, DeployError::Failed { .. }), "got: {err}");
        assert!(err.to_string().contains("gateway said no"), "got: {err}");
    }

    #[cfg(unix)]
    #[test]
    fn slow_command_times_out() {
        let root = TempDir::new().unwrap();
        let p = project(root.path());
        let d = deployer(sh("sleep 3")).with_timeout(Duration::from_millis(200));
        let err = d
            .deploy(&DeployRequest { project: &p, environment: "dev", override_: None })
            .unwrap_err();
        assert!(matches!(err, DeployError::TimedOut { .. }), "got: {err}");
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let root = TempDir::new().unwrap();
        let p = project(root.path());
        let d = deployer(CommandSpec {
            program: "apisync-no-such-program".into(),
            args: vec![],
        });
        let err = d
            .deploy(&DeployRequest { project: &p, environment: "dev", override_: None })
            .unwrap_err();
        assert!(matches!(err, DeployError::Spawn { .. }), "got: {err}");
    }

    #[test]
    fn unconfigured_types_are_unsupported() {
        let d = deployer(sh("true"));
        assert!(d.supports(ProjectType::Api));
        assert!(!d.supports(ProjectType::Application));
    }

    #[cfg(unix)]
    #[test]
    fn each_type_runs_its_own_command() {
        let root = TempDir::new().unwrap();
        let marker = root.path().join("ran");
        let d = CommandDeployer::from_config(&DeployConfig {
            commands: DeployCommands {
                api: Some(sh("exit 7")),
                api_product: Some(sh(&format!("echo {{type}} > '{}'", marker.display()))),
                application: None,
            },
            ..DeployConfig::default()
        });
        let product = ProjectParams {
            name: ProjectName::from("gold"),
            base_path: root.path().to_path_buf(),
            relative_path: PathBuf::from("products/gold"),
            params: ParamSet::ApiProduct(ApiProductParams::default()),
        };

        assert!(d.supports(ProjectType::ApiProduct));
        d.deploy(&DeployRequest { project: &product, environment: "dev", override_: None })
            .expect("product command");
        assert!(marker.exists());
        assert!(!d.supports(ProjectType::Application));
    }
}
