//! GraphQL client configuration.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{AuthConfig, GraphQLError, Result};

/// Environment variable holding the endpoint URL.
pub const ENV_ENDPOINT: &str = "GRAPHQL_ENDPOINT";
/// Environment variable holding the auth credentials.
pub const ENV_CREDENTIALS: &str = "GRAPHQL_CREDENTIALS";
/// Environment variable holding the auth scheme id.
pub const ENV_SCHEME: &str = "GRAPHQL_AUTHENTICATION";
/// Environment variable holding the auth header name.
pub const ENV_HEADER: &str = "GRAPHQL_AUTHENTICATION_HEADER";

/// GraphQL client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphQLClientConfig {
    /// Default GraphQL endpoint URL.
    pub graphql_endpoint: String,
    /// Credentials for the auth header. No header is sent when unset.
    pub auth_credentials: Option<String>,
    /// Scheme id looked up in `auth_schemes`.
    pub auth_scheme: String,
    /// Header name carrying the credentials.
    pub auth_header: String,
    /// Scheme id to prefix. `None` (or an empty string in files) means no prefix.
    #[serde(deserialize_with = "deserialize_schemes")]
    pub auth_schemes: HashMap<String, Option<String>>,
}

impl Default for GraphQLClientConfig {
    fn default() -> Self {
        let mut auth_schemes = HashMap::new();
        auth_schemes.insert("basic".to_string(), Some("Basic ".to_string()));
        auth_schemes.insert("bearer".to_string(), Some("Bearer ".to_string()));
        auth_schemes.insert("custom".to_string(), None);

        Self {
            graphql_endpoint: "http://localhost:4000/graphql".to_string(),
            auth_credentials: None,
            auth_scheme: "bearer".to_string(),
            auth_header: "Authorization".to_string(),
            auth_schemes,
        }
    }
}

fn deserialize_schemes<'de, D>(deserializer: D) -> std::result::Result<HashMap<String, Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = HashMap::<String, Option<String>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(scheme, prefix)| (scheme, prefix.filter(|p| !p.is_empty())))
        .collect())
}

impl GraphQLClientConfig {
    /// Create a new configuration builder.
    pub fn builder() -> GraphQLClientConfigBuilder {
        GraphQLClientConfigBuilder::default()
    }

    /// Create configuration for a specific endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            graphql_endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Load configuration from `GRAPHQL_*` environment variables over the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(endpoint) = env::var(ENV_ENDPOINT) {
            config.graphql_endpoint = endpoint;
        }
        if let Ok(credentials) = env::var(ENV_CREDENTIALS) {
            config.auth_credentials = Some(credentials).filter(|c| !c.is_empty());
        }
        if let Ok(scheme) = env::var(ENV_SCHEME) {
            config.auth_scheme = scheme;
        }
        if let Ok(header) = env::var(ENV_HEADER) {
            config.auth_header = header;
        }
        config
    }

    /// Load a `.env` file, then read the environment.
    ///
    /// Without a path a missing `.env` in the working directory is ignored.
    pub fn from_dotenv(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            dotenvy::from_path(path).map_err(|e| GraphQLError::Config(e.to_string()))?;
        } else {
            dotenvy::dotenv().ok();
        }
        Ok(Self::from_env())
    }

    /// Load configuration from a JSON or TOML file, picked by extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| GraphQLError::Config("No file extension found".to_string()))?;

        let content = fs::read_to_string(path)
            .map_err(|e| GraphQLError::Config(format!("Failed to read file: {}", e)))?;

        match ext.to_lowercase().as_str() {
            "json" => Self::from_json_str(&content),
            "toml" => Self::from_toml_str(&content),
            other => Err(GraphQLError::Config(format!("Unsupported format: {}", other))),
        }
    }

    /// Parse configuration from a JSON document.
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| GraphQLError::Config(format!("JSON parse error: {}", e)))
    }

    /// Parse configuration from a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| GraphQLError::Config(format!("TOML parse error: {}", e)))
    }
}

/// Builder for GraphQL client configuration.
#[derive(Debug, Default)]
pub struct GraphQLClientConfigBuilder {
    config: GraphQLClientConfig,
}

impl GraphQLClientConfigBuilder {
    /// Set the GraphQL endpoint URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.graphql_endpoint = endpoint.into();
        self
    }

    /// Set the auth credentials.
    pub fn credentials(mut self, credentials: impl Into<String>) -> Self {
        self.config.auth_credentials = Some(credentials.into());
        self
    }

    /// Set the auth scheme id.
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.config.auth_scheme = scheme.into();
        self
    }

    /// Set the auth header name.
    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.config.auth_header = header.into();
        self
    }

    /// Register a scheme in the scheme table. `None` registers it without a prefix.
    pub fn auth_scheme(mut self, scheme: impl Into<String>, prefix: Option<&str>) -> Self {
        self.config
            .auth_schemes
            .insert(scheme.into(), prefix.map(str::to_string));
        self
    }

    /// Set bearer authentication.
    pub fn bearer_auth(self, token: impl Into<String>) -> Self {
        self.credentials(token).scheme("bearer")
    }

    /// Build the configuration.
    pub fn build(self) -> GraphQLClientConfig {
        self.config
    }
}

/// Source of the endpoint and auth settings used by a client.
///
/// Providers are consulted on every header read, never cached by the client.
pub trait ConfigProvider: Send + Sync {
    /// Default GraphQL endpoint URL.
    fn endpoint(&self) -> String;

    /// Current auth settings.
    fn auth_config(&self) -> AuthConfig;
}

impl ConfigProvider for GraphQLClientConfig {
    fn endpoint(&self) -> String {
        self.graphql_endpoint.clone()
    }

    fn auth_config(&self) -> AuthConfig {
        AuthConfig::from(self)
    }
}

/// Configuration that can be changed while clients are using it.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<GraphQLClientConfig>>,
}

impl SharedConfig {
    /// Wrap a configuration.
    pub fn new(config: GraphQLClientConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Modify the configuration in place.
    pub fn update(&self, f: impl FnOnce(&mut GraphQLClientConfig)) {
        let mut config = self.inner.write();
        f(&mut *config);
    }

    /// Copy of the current configuration.
    pub fn snapshot(&self) -> GraphQLClientConfig {
        self.inner.read().clone()
    }
}

impl ConfigProvider for SharedConfig {
    fn endpoint(&self) -> String {
        self.inner.read().graphql_endpoint.clone()
    }

    fn auth_config(&self) -> AuthConfig {
        AuthConfig::from(&*self.inner.read())
    }
}
