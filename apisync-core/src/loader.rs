//! Reading a parameter file into a [`ParamSet`].

use std::path::Path;

use crate::envsubst;
use crate::error::ParamsError;
use crate::params::{ApiParams, ApiProductParams, ApplicationParams};
use crate::types::{ParamSet, ProjectType};

/// Read, substitute and parse the parameter file of a `kind` project.
///
/// Variables are resolved against the process environment.
pub fn load_params(path: &Path, kind: ProjectType) -> Result<ParamSet, ParamsError> {
    let text = std::fs::read_to_string(path).map_err(|source| ParamsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_params(path, &text, kind, |name| std::env::var(name).ok())
}

/// Substitute and parse already-read file contents. `path` is only used in
/// error messages.
pub fn parse_params<F>(
    path: &Path,
    text: &str,
    kind: ProjectType,
    lookup: F,
) -> Result<ParamSet, ParamsError>
where
    F: FnMut(&str) -> Option<String>,
{
    let expanded =
        envsubst::substitute_with(text, lookup).map_err(|missing| ParamsError::EnvSubstitution {
            path: path.to_path_buf(),
            missing,
        })?;

    // An empty or comment-only file is a valid, default parameter set.
    if expanded.lines().all(|l| {
        let l = l.trim();
        l.is_empty() || l.starts_with('#') || l == "---"
    }) {
        return Ok(default_params(kind));
    }

    let parse_err = |source| ParamsError::Parse {
        path: path.to_path_buf(),
        source,
    };
    Ok(match kind {
        ProjectType::Api => ParamSet::Api(serde_yaml::from_str(&expanded).map_err(parse_err)?),
        ProjectType::ApiProduct => {
            ParamSet::ApiProduct(serde_yaml::from_str(&expanded).map_err(parse_err)?)
        }
        ProjectType::Application => {
            ParamSet::Application(serde_yaml::from_str(&expanded).map_err(parse_err)?)
        }
    })
}

fn default_params(kind: ProjectType) -> ParamSet {
    match kind {
        ProjectType::Api => ParamSet::Api(ApiParams::default()),
        ProjectType::ApiProduct => ParamSet::ApiProduct(ApiProductParams::default()),
        ProjectType::Application => ParamSet::Application(ApplicationParams::default()),
    }
}
