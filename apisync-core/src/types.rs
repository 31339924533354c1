//! Domain types for discovered deployment projects.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::params::{ApiParams, ApiProductParams, ApplicationParams};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for a project, taken from the last segment of its root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectName(pub String);

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ProjectName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProjectName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// The kind of a deployment project.
///
/// Variant order is the marker priority order and the order in which grouped
/// projects are processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProjectType {
    Api,
    ApiProduct,
    Application,
}

impl ProjectType {
    /// Every project type in priority order.
    pub fn all() -> &'static [ProjectType] {
        &[
            ProjectType::Api,
            ProjectType::ApiProduct,
            ProjectType::Application,
        ]
    }

    /// Name of the parameter file that marks a directory as this kind of project.
    pub fn marker_file(self) -> &'static str {
        match self {
            ProjectType::Api => "api_params.yaml",
            ProjectType::ApiProduct => "api_product_params.yaml",
            ProjectType::Application => "application_params.yaml",
        }
    }

    /// Plural label used in grouped listings.
    pub fn plural(self) -> &'static str {
        match self {
            ProjectType::Api => "APIs",
            ProjectType::ApiProduct => "API Products",
            ProjectType::Application => "Applications",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectType::Api => write!(f, "api"),
            ProjectType::ApiProduct => write!(f, "apiProduct"),
            ProjectType::Application => write!(f, "application"),
        }
    }
}

// ---------------------------------------------------------------------------
// Project params
// ---------------------------------------------------------------------------

/// The parameter file contents of a project. Exactly one block exists, and it
/// decides the project type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "params", rename_all = "camelCase")]
pub enum ParamSet {
    Api(ApiParams),
    ApiProduct(ApiProductParams),
    Application(ApplicationParams),
}

impl ParamSet {
    pub fn project_type(&self) -> ProjectType {
        match self {
            ParamSet::Api(_) => ProjectType::Api,
            ParamSet::ApiProduct(_) => ProjectType::ApiProduct,
            ParamSet::Application(_) => ProjectType::Application,
        }
    }

    pub fn as_api(&self) -> Option<&ApiParams> {
        match self {
            ParamSet::Api(p) => Some(p),
            _ => None,
        }
    }
}

/// One discovered project root.
///
/// Built once by the classifier and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectParams {
    pub name: ProjectName,
    /// Absolute path of the project root; the deduplication key.
    pub base_path: PathBuf,
    /// `base_path` relative to the repository root.
    pub relative_path: PathBuf,
    pub params: ParamSet,
}

impl ProjectParams {
    pub fn project_type(&self) -> ProjectType {
        self.params.project_type()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
