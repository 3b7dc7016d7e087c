//! Authentication header resolution.

use std::collections::HashMap;

use tracing::debug;

use crate::{GraphQLClientConfig, GraphQLError, Result};

/// Snapshot of the auth settings taken from a configuration provider.
///
/// The scheme table maps a scheme id to the prefix placed in front of the
/// credentials. `None` is the explicit "no prefix" marker and is different
/// from the scheme being missing from the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthConfig {
    /// Credentials sent in the auth header.
    pub credentials: Option<String>,
    /// Scheme id looked up in `schemes`.
    pub scheme: String,
    /// Header name carrying the credentials.
    pub header: String,
    /// Scheme id to optional prefix.
    pub schemes: HashMap<String, Option<String>>,
}

impl AuthConfig {
    /// Resolve the auth header line, if any.
    ///
    /// Returns `Ok(None)` when no credentials are configured and
    /// [`GraphQLError::InvalidAuthScheme`] when the scheme id is unknown.
    pub fn resolve(&self) -> Result<Option<String>> {
        let credentials = match self.credentials.as_deref() {
            Some(credentials) if !credentials.is_empty() => credentials,
            _ => return Ok(None),
        };

        let prefix = self
            .schemes
            .get(&self.scheme)
            .ok_or_else(|| GraphQLError::InvalidAuthScheme(self.scheme.clone()))?;

        debug!(scheme = %self.scheme, header = %self.header, "Resolved auth header");

        let line = match prefix {
            Some(prefix) => format!("{}: {}{}", self.header, prefix, credentials),
            None => format!("{}: {}", self.header, credentials),
        };
        Ok(Some(line))
    }
}

impl From<&GraphQLClientConfig> for AuthConfig {
    fn from(config: &GraphQLClientConfig) -> Self {
        Self {
            credentials: config.auth_credentials.clone(),
            scheme: config.auth_scheme.clone(),
            header: config.auth_header.clone(),
            schemes: config.auth_schemes.clone(),
        }
    }
}
