//! Typed schema of project parameter files.
//!
//! An API project carries `api_params.yaml`:
//!
//! ```yaml
//! environments:
//!   - name: production
//!     endpointType: rest            # rest | soap | dynamic | aws
//!     endpointRoutingPolicy: failover
//!     failoverEndpoints:
//!       production: { url: https://primary.example.com }
//!       productionFailovers:
//!         - url: https://backup.example.com
//!     security:
//!       enabled: true
//!       type: basic
//!       username: admin
//!       password: ${ORDERS_BACKEND_PASSWORD}
//!     certs:
//!       - hostName: https://primary.example.com
//!         alias: primary
//!         path: certs/primary.crt
//! deploy:
//!   import:
//!     update: true
//!     preserveProvider: false
//! ```
//!
//! YAML keys are the compatibility surface and must not change. The four
//! endpoint blocks are alternatives: an [`Environment`] holds at most one of
//! them as an [`EndpointStrategy`], and anything ambiguous is rejected while
//! deserializing.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::PathBuf;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Endpoint leaves
// ---------------------------------------------------------------------------

/// What the gateway does with a message when an endpoint faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultAction {
    Fault,
    Discard,
}

/// Retry and suspension tuning for one endpoint.
///
/// Every field is optional: an absent field inherits the remote default and
/// is never treated as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EndpointConfig {
    #[serde(rename = "retryTimeOut", skip_serializing_if = "Option::is_none")]
    pub retry_timeout: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_delay: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factor: Option<f64>,
    #[serde(
        rename = "retryErroCode",
        alias = "retryErrorCode",
        deserialize_with = "error_codes",
        skip_serializing_if = "Option::is_none"
    )]
    pub retry_error_codes: Option<Vec<String>>,
    #[serde(
        rename = "suspendErrorCode",
        deserialize_with = "error_codes",
        skip_serializing_if = "Option::is_none"
    )]
    pub suspend_error_codes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspend_duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspend_max_duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_select: Option<FaultAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_duration: Option<u64>,
}

/// A single backend endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<EndpointConfig>,
}

/// One production endpoint and one sandbox endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointPair {
    pub production: Option<Endpoint>,
    pub sandbox: Option<Endpoint>,
}

/// Session affinity for a load-balanced pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionManagement {
    #[default]
    Transport,
    Soap,
    SimpleClientSession,
    None,
}

/// A round-robin pool of endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoadBalanceEndpoints {
    pub production: Vec<Endpoint>,
    pub sandbox: Vec<Endpoint>,
    pub session_management: SessionManagement,
    #[serde(rename = "sessionTimeOut", skip_serializing_if = "Option::is_none")]
    pub session_timeout: Option<u64>,
}

/// A primary endpoint with an ordered list of fallbacks, per tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FailoverEndpoints {
    pub production: Option<Endpoint>,
    pub production_failovers: Vec<Endpoint>,
    pub sandbox: Option<Endpoint>,
    pub sandbox_failovers: Vec<Endpoint>,
}

/// How the gateway obtains AWS credentials.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AwsAccessMethod {
    #[default]
    RoleSupplied,
    Stored,
}

/// Serverless invocation settings.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AwsLambdaEndpoints {
    pub access_method: AwsAccessMethod,
    pub amzn_region: Option<String>,
    pub amzn_access_key: Option<String>,
    pub amzn_secret_key: Option<String>,
}

impl fmt::Debug for AwsLambdaEndpoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsLambdaEndpoints")
            .field("access_method", &self.access_method)
            .field("amzn_region", &self.amzn_region)
            .field("amzn_access_key", &self.amzn_access_key)
            .field("amzn_secret_key", &self.amzn_secret_key.as_ref().map(|_| "***"))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Endpoint strategy
// ---------------------------------------------------------------------------

/// Protocol family of the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointType {
    #[default]
    Rest,
    Soap,
    Dynamic,
    Aws,
}

impl fmt::Display for EndpointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointType::Rest => write!(f, "rest"),
            EndpointType::Soap => write!(f, "soap"),
            EndpointType::Dynamic => write!(f, "dynamic"),
            EndpointType::Aws => write!(f, "aws"),
        }
    }
}

/// Value of the optional `endpointRoutingPolicy` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RoutingPolicy {
    LoadBalanced,
    Failover,
}

/// How an environment reaches its backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "routing", content = "endpoints", rename_all = "snake_case")]
pub enum EndpointStrategy {
    Single(EndpointPair),
    LoadBalanced(LoadBalanceEndpoints),
    Failover(FailoverEndpoints),
    AwsLambda(AwsLambdaEndpoints),
}

impl EndpointStrategy {
    /// Short label for listings.
    pub fn label(&self) -> &'static str {
        match self {
            EndpointStrategy::Single(_) => "single",
            EndpointStrategy::LoadBalanced(_) => "load_balanced",
            EndpointStrategy::Failover(_) => "failover",
            EndpointStrategy::AwsLambda(_) => "aws_lambda",
        }
    }

    /// Production URLs in routing order: the primary first, then failovers
    /// or the remaining pool members.
    pub fn production_urls(&self) -> Vec<&str> {
        match self {
            EndpointStrategy::Single(pair) => urls(pair.production.iter()),
            EndpointStrategy::LoadBalanced(lb) => urls(lb.production.iter()),
            EndpointStrategy::Failover(fo) => {
                urls(fo.production.iter().chain(fo.production_failovers.iter()))
            }
            EndpointStrategy::AwsLambda(_) => Vec::new(),
        }
    }

    /// Sandbox URLs in routing order.
    pub fn sandbox_urls(&self) -> Vec<&str> {
        match self {
            EndpointStrategy::Single(pair) => urls(pair.sandbox.iter()),
            EndpointStrategy::LoadBalanced(lb) => urls(lb.sandbox.iter()),
            EndpointStrategy::Failover(fo) => {
                urls(fo.sandbox.iter().chain(fo.sandbox_failovers.iter()))
            }
            EndpointStrategy::AwsLambda(_) => Vec::new(),
        }
    }
}

fn urls<'a>(endpoints: impl Iterator<Item = &'a Endpoint>) -> Vec<&'a str> {
    endpoints.filter_map(|e| e.url.as_deref()).collect()
}

// ---------------------------------------------------------------------------
// Security
// ---------------------------------------------------------------------------

/// Username and password for Basic or Digest endpoint auth.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// OAuth2 grant used to call the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "grantType", rename_all = "snake_case")]
pub enum OAuthGrant {
    ClientCredentials,
    Password(Credentials),
}

/// OAuth2 endpoint security.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthSecurity {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub grant: OAuthGrant,
    pub custom_parameters: BTreeMap<String, String>,
    /// `client_secret` is already encrypted and must be passed through as is.
    pub secret_encrypted: bool,
}

impl fmt::Debug for OAuthSecurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthSecurity")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("grant", &self.grant)
            .field("custom_parameters", &self.custom_parameters)
            .field("secret_encrypted", &self.secret_encrypted)
            .finish()
    }
}

/// Security applied when the gateway calls the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EndpointSecurity {
    /// Also the value of a `security` block that omits `enabled`.
    Disabled,
    Basic(Credentials),
    Digest(Credentials),
    #[serde(rename = "oauth")]
    OAuth(OAuthSecurity),
}

impl EndpointSecurity {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, EndpointSecurity::Disabled)
    }

    pub fn label(&self) -> &'static str {
        match self {
            EndpointSecurity::Disabled => "disabled",
            EndpointSecurity::Basic(_) => "basic",
            EndpointSecurity::Digest(_) => "digest",
            EndpointSecurity::OAuth(_) => "oauth",
        }
    }
}

// ---------------------------------------------------------------------------
// Certificates
// ---------------------------------------------------------------------------

/// Trust material for one backend host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cert {
    pub host_name: String,
    pub alias: String,
    pub path: PathBuf,
}

/// A client certificate for mutual TLS, bound to a subscription tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutualSslCert {
    pub tier_name: String,
    pub alias: String,
    pub path: PathBuf,
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// The override bundle for one named deployment target.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub name: String,
    pub endpoint_type: EndpointType,
    pub strategy: Option<EndpointStrategy>,
    pub security: Option<EndpointSecurity>,
    pub certs: Vec<Cert>,
    pub mutual_ssl_certs: Vec<MutualSslCert>,
    pub gateway_environments: Option<Vec<String>>,
    pub policies: Option<Vec<String>>,
}

impl<'de> Deserialize<'de> for Environment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawEnvironment::deserialize(deserializer)?;
        Environment::try_from(raw).map_err(D::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Deploy flags
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiImportParams {
    pub update: bool,
    pub preserve_provider: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiDeployParams {
    pub import: ApiImportParams,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiProductImportParams {
    pub import_apis: bool,
    pub update_apis: bool,
    pub update_api_product: bool,
    pub preserve_provider: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiProductDeployParams {
    pub import: ApiProductImportParams,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApplicationImportParams {
    pub update: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_owner: Option<String>,
    pub preserve_owner: bool,
    pub skip_keys: bool,
    pub skip_subscriptions: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationDeployParams {
    pub import: ApplicationImportParams,
}

// ---------------------------------------------------------------------------
// Parameter files
// ---------------------------------------------------------------------------

/// Contents of `api_params.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApiParams {
    pub environments: Vec<Environment>,
    pub deploy: ApiDeployParams,
}

impl ApiParams {
    /// Exact, case-sensitive lookup. Names are unique, so at most one matches.
    pub fn environment(&self, name: &str) -> Option<&Environment> {
        self.environments.iter().find(|env| env.name == name)
    }
}

impl<'de> Deserialize<'de> for ApiParams {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawApiParams::deserialize(deserializer)?;
        let mut seen = HashSet::new();
        for env in &raw.environments {
            if !seen.insert(env.name.as_str()) {
                return Err(D::Error::custom(format!(
                    "duplicate environment name '{}'",
                    env.name
                )));
            }
        }
        Ok(ApiParams {
            environments: raw.environments,
            deploy: raw.deploy,
        })
    }
}

/// Contents of `api_product_params.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiProductParams {
    pub deploy: ApiProductDeployParams,
}

/// Contents of `application_params.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationParams {
    pub deploy: ApplicationDeployParams,
}

// ---------------------------------------------------------------------------
// Raw on-disk shapes
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawApiParams {
    environments: Vec<Environment>,
    deploy: ApiDeployParams,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEnvironment {
    name: String,
    #[serde(default)]
    endpoint_type: Option<EndpointType>,
    #[serde(default)]
    endpoint_routing_policy: Option<RoutingPolicy>,
    #[serde(default)]
    endpoints: Option<EndpointPair>,
    #[serde(default)]
    load_balance_endpoints: Option<LoadBalanceEndpoints>,
    #[serde(default)]
    failover_endpoints: Option<FailoverEndpoints>,
    #[serde(default, rename = "awsLambdaEndpoints")]
    aws_lambda_endpoints: Option<AwsLambdaEndpoints>,
    #[serde(default)]
    security: Option<RawSecurity>,
    #[serde(default)]
    certs: Vec<Cert>,
    #[serde(default)]
    mutual_ssl_certs: Vec<MutualSslCert>,
    #[serde(default)]
    gateway_environments: Option<Vec<String>>,
    #[serde(default)]
    policies: Option<Vec<String>>,
}

impl TryFrom<RawEnvironment> for Environment {
    type Error = String;

    fn try_from(raw: RawEnvironment) -> Result<Self, Self::Error> {
        let name = raw.name;
        if name.trim().is_empty() {
            return Err("environment name must not be empty".to_string());
        }

        let populated: Vec<&str> = [
            ("endpoints", raw.endpoints.is_some()),
            ("loadBalanceEndpoints", raw.load_balance_endpoints.is_some()),
            ("failoverEndpoints", raw.failover_endpoints.is_some()),
            ("awsLambdaEndpoints", raw.aws_lambda_endpoints.is_some()),
        ]
        .into_iter()
        .filter_map(|(key, set)| set.then_some(key))
        .collect();
        if populated.len() > 1 {
            return Err(format!(
                "environment '{name}': only one endpoint block may be set, found {}",
                populated.join(", ")
            ));
        }

        let endpoint_type = raw.endpoint_type.unwrap_or_default();
        let strategy = match endpoint_type {
            EndpointType::Aws => {
                if raw.endpoint_routing_policy.is_some() {
                    return Err(format!(
                        "environment '{name}': endpointRoutingPolicy does not apply to aws endpoints"
                    ));
                }
                let Some(aws) = raw.aws_lambda_endpoints else {
                    return Err(format!(
                        "environment '{name}': endpointType aws requires awsLambdaEndpoints"
                    ));
                };
                if aws.access_method == AwsAccessMethod::Stored
                    && (is_blank(&aws.amzn_region)
                        || is_blank(&aws.amzn_access_key)
                        || is_blank(&aws.amzn_secret_key))
                {
                    return Err(format!(
                        "environment '{name}': stored AWS credentials need amznRegion, amznAccessKey and amznSecretKey"
                    ));
                }
                Some(EndpointStrategy::AwsLambda(aws))
            }
            EndpointType::Dynamic => {
                if let Some(key) = populated.first() {
                    return Err(format!(
                        "environment '{name}': dynamic endpoints take no {key} block"
                    ));
                }
                if raw.endpoint_routing_policy.is_some() {
                    return Err(format!(
                        "environment '{name}': endpointRoutingPolicy does not apply to dynamic endpoints"
                    ));
                }
                None
            }
            EndpointType::Rest | EndpointType::Soap => {
                if raw.aws_lambda_endpoints.is_some() {
                    return Err(format!(
                        "environment '{name}': awsLambdaEndpoints requires endpointType aws"
                    ));
                }
                let block = if let Some(pair) = raw.endpoints {
                    Some(EndpointStrategy::Single(pair))
                } else if let Some(lb) = raw.load_balance_endpoints {
                    Some(EndpointStrategy::LoadBalanced(lb))
                } else {
                    raw.failover_endpoints.map(EndpointStrategy::Failover)
                };
                match (raw.endpoint_routing_policy, block) {
                    (None, block) => block,
                    (Some(RoutingPolicy::LoadBalanced), Some(s @ EndpointStrategy::LoadBalanced(_))) => {
                        Some(s)
                    }
                    (Some(RoutingPolicy::Failover), Some(s @ EndpointStrategy::Failover(_))) => {
                        Some(s)
                    }
                    (Some(RoutingPolicy::LoadBalanced), _) => {
                        return Err(format!(
                            "environment '{name}': endpointRoutingPolicy load_balanced requires loadBalanceEndpoints"
                        ))
                    }
                    (Some(RoutingPolicy::Failover), _) => {
                        return Err(format!(
                            "environment '{name}': endpointRoutingPolicy failover requires failoverEndpoints"
                        ))
                    }
                }
            }
        };

        let security = raw
            .security
            .map(|s| s.into_security(&name))
            .transpose()?;

        Ok(Environment {
            name,
            endpoint_type,
            strategy,
            security,
            certs: raw.certs,
            mutual_ssl_certs: raw.mutual_ssl_certs,
            gateway_environments: raw.gateway_environments,
            policies: raw.policies,
        })
    }
}

/// `enabled` is a bool in newer files and a quoted string in older ones.
#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Text(String),
}

impl Flag {
    fn value(&self) -> Result<bool, String> {
        match self {
            Flag::Bool(b) => Ok(*b),
            Flag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" | "" => Ok(false),
                other => Err(format!("invalid boolean '{other}' for security.enabled")),
            },
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RawSecurity {
    enabled: Option<Flag>,
    #[serde(rename = "type")]
    kind: Option<String>,
    username: Option<String>,
    password: Option<String>,
    token_url: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    grant_type: Option<String>,
    custom_parameters: BTreeMap<String, String>,
    is_secret_encrypted: bool,
}

impl RawSecurity {
    fn into_security(self, env: &str) -> Result<EndpointSecurity, String> {
        let enabled = match &self.enabled {
            Some(flag) => flag.value().map_err(|e| format!("environment '{env}': {e}"))?,
            None => false,
        };
        if !enabled {
            return Ok(EndpointSecurity::Disabled);
        }

        let kind = self
            .kind
            .as_deref()
            .map(|k| k.trim().to_ascii_lowercase())
            .ok_or_else(|| format!("environment '{env}': security is enabled but type is missing"))?;
        match kind.as_str() {
            "basic" => Ok(EndpointSecurity::Basic(credentials(
                env,
                self.username,
                self.password,
            )?)),
            "digest" => Ok(EndpointSecurity::Digest(credentials(
                env,
                self.username,
                self.password,
            )?)),
            "oauth" => {
                let token_url = required(env, "tokenUrl", self.token_url)?;
                let client_id = required(env, "clientId", self.client_id)?;
                let client_secret = required(env, "clientSecret", self.client_secret)?;
                let grant_type = required(env, "grantType", self.grant_type)?;
                let grant = match grant_type.to_ascii_lowercase().as_str() {
                    "client_credentials" => OAuthGrant::ClientCredentials,
                    "password" => {
                        OAuthGrant::Password(credentials(env, self.username, self.password)?)
                    }
                    other => {
                        return Err(format!(
                            "environment '{env}': unsupported OAuth grant type '{other}'"
                        ))
                    }
                };
                Ok(EndpointSecurity::OAuth(OAuthSecurity {
                    token_url,
                    client_id,
                    client_secret,
                    grant,
                    custom_parameters: self.custom_parameters,
                    secret_encrypted: self.is_secret_encrypted,
                }))
            }
            other => Err(format!(
                "environment '{env}': unknown security type '{other}' (expected basic, digest or oauth)"
            )),
        }
    }
}

fn credentials(
    env: &str,
    username: Option<String>,
    password: Option<String>,
) -> Result<Credentials, String> {
    Ok(Credentials {
        username: required(env, "username", username)?,
        password: required(env, "password", password)?,
    })
}

fn required(env: &str, key: &str, value: Option<String>) -> Result<String, String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(format!(
            "environment '{env}': security is enabled but {key} is missing"
        )),
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Error codes are written as numbers or as quoted strings.
fn error_codes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<String>>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Number(u64),
        Text(String),
    }

    let codes = Option::<Vec<Code>>::deserialize(deserializer)?;
    Ok(codes.map(|codes| {
        codes
            .into_iter()
            .map(|c| match c {
                Code::Number(n) => n.to_string(),
                Code::Text(s) => s,
            })
            .collect()
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
