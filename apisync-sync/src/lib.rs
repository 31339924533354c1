//! # apisync-sync
//!
//! Environment resolution, deployment and run bookkeeping.
//!
//! Call [`sync`] to resolve a list of changed paths and deploy every affected
//! project, or [`pipeline::run`] to do the same with retries of earlier
//! failures and a recorded VCS state.

pub mod deploy;
pub mod environment;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod repo_info;
pub mod report;
pub mod state;

pub use deploy::{CommandDeployer, DeployRequest, Deployer, DryRunDeployer};
pub use environment::{resolve_environment, EnvironmentOverride};
pub use error::{DeployError, SyncError};
pub use orchestrator::{deploy_change_set, sync, CancelFlag, SyncOptions};
pub use report::{ProjectOutcome, ProjectReport, SyncReport};
