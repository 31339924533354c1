//! apisync core library: parameter-file schema, loading, project types, config.
//!
//! - [`params`]: typed schema of `*_params.yaml`
//! - [`envsubst`]: `${VAR}` / `$VAR` substitution
//! - [`loader`]: [`load_params`]
//! - [`types`]: project types and discovered projects
//! - [`config`]: `~/.apisync/config.yaml`
//! - [`error`]: [`ParamsError`], [`ConfigError`]

pub mod config;
pub mod envsubst;
pub mod error;
pub mod loader;
pub mod params;
pub mod types;

pub use config::Config;
pub use error::{ConfigError, ParamsError};
pub use loader::{load_params, parse_params};
pub use params::{ApiParams, ApiProductParams, ApplicationParams, EndpointStrategy, Environment};
pub use types::{ParamSet, ProjectName, ProjectParams, ProjectType};
