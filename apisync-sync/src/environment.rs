//! Selecting a project's environment override for the deployment target.

use std::path::{Path, PathBuf};

use apisync_core::params::{
    ApiParams, Cert, EndpointSecurity, EndpointStrategy, EndpointType, Environment, MutualSslCert,
};
use serde::Serialize;

/// Find the environment named exactly `name`. There is no fallback and no
/// case folding; `None` means "deploy with the project's own defaults".
pub fn resolve_environment<'a>(params: &'a ApiParams, name: &str) -> Option<&'a Environment> {
    params.environment(name)
}

/// The settings handed to the deployer for one API project and environment.
///
/// Certificate paths are made absolute against the project root.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentOverride {
    pub name: String,
    pub endpoint_type: EndpointType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<EndpointStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<EndpointSecurity>,
    pub certs: Vec<Cert>,
    pub mutual_ssl_certs: Vec<MutualSslCert>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_environments: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policies: Option<Vec<String>>,
}

impl EnvironmentOverride {
    pub fn for_project(env: &Environment, project_root: &Path) -> Self {
        let certs = env
            .certs
            .iter()
            .map(|c| Cert {
                path: anchor(project_root, &c.path),
                ..c.clone()
            })
            .collect();
        let mutual_ssl_certs = env
            .mutual_ssl_certs
            .iter()
            .map(|c| MutualSslCert {
                path: anchor(project_root, &c.path),
                ..c.clone()
            })
            .collect();
        Self {
            name: env.name.clone(),
            endpoint_type: env.endpoint_type,
            strategy: env.strategy.clone(),
            security: env.security.clone(),
            certs,
            mutual_ssl_certs,
            gateway_environments: env.gateway_environments.clone(),
            policies: env.policies.clone(),
        }
    }

    /// Production URLs, primary first.
    pub fn production_urls(&self) -> Vec<&str> {
        self.strategy
            .as_ref()
            .map(EndpointStrategy::production_urls)
            .unwrap_or_default()
    }

    /// Sandbox URLs, primary first.
    pub fn sandbox_urls(&self) -> Vec<&str> {
        self.strategy
            .as_ref()
            .map(EndpointStrategy::sandbox_urls)
            .unwrap_or_default()
    }
}

fn anchor(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ApiParams {
        serde_yaml::from_str(
            "environments:\n\
             \x20 - name: production\n\
             \x20   failoverEndpoints:\n\
             \x20     production: { url: http://primary }\n\
             \x20     productionFailovers:\n\
             \x20       - url: http://backup\n\
             \x20     sandbox: { url: http://sb }\n\
             \x20   certs:\n\
             \x20     - hostName: http://primary\n\
             \x20       alias: primary\n\
             \x20       path: certs/primary.crt\n\
             \x20     - hostName: http://backup\n\
             \x20       alias: backup\n\
             \x20       path: /etc/ssl/backup.crt\n",
        )
        .expect("params")
    }

    #[test]
    fn lookup_is_exact() {
        let p = params();
        assert!(resolve_environment(&p, "production").is_some());
        assert!(resolve_environment(&p, "dev").is_none());
        assert!(resolve_environment(&p, "PRODUCTION").is_none());
        assert!(resolve_environment(&p, "prod").is_none());
    }

    #[test]
    fn override_lists_urls_in_routing_order() {
        let p = params();
        let env = resolve_environment(&p, "production").unwrap();
        let ov = EnvironmentOverride::for_project(env, Path::new("/repo/apis/orders"));
        assert_eq!(ov.production_urls(), vec!["http://primary", "http://backup"]);
        assert_eq!(ov.sandbox_urls(), vec!["http://sb"]);
    }

    #[test]
    fn relative_cert_paths_are_anchored_at_project_root() {
        let p = params();
        let env = resolve_environment(&p, "production").unwrap();
        let ov = EnvironmentOverride::for_project(env, Path::new("/repo/apis/orders"));
        assert_eq!(ov.certs[0].path, PathBuf::from("/repo/apis/orders/certs/primary.crt"));
        assert_eq!(ov.certs[1].path, PathBuf::from("/etc/ssl/backup.crt"));
    }

    #[test]
    fn serialized_override_uses_camel_case() {
        let p = params();
        let env = resolve_environment(&p, "production").unwrap();
        let ov = EnvironmentOverride::for_project(env, Path::new("/r"));
        let json = serde_json::to_value(&ov).unwrap();
        assert_eq!(json["endpointType"], "rest");
        assert_eq!(json["strategy"]["routing"], "failover");
        assert_eq!(json["certs"][0]["hostName"], "http://primary");
        assert!(json.get("security").is_none());
    }
}
