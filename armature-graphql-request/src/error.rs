//! GraphQL request error types.

use thiserror::Error;

/// Result type for GraphQL request operations.
pub type Result<T> = std::result::Result<T, GraphQLError>;

/// GraphQL request errors.
#[derive(Debug, Error)]
pub enum GraphQLError {
    /// The configured auth scheme has no entry in the scheme table.
    #[error("Invalid auth scheme: {0}")]
    InvalidAuthScheme(String),

    /// A dynamic call did not follow the `with<Name>` convention.
    #[error("Method [{0}] does not exist.")]
    UnsupportedOperation(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Header line that cannot be split into a name and a value.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GraphQLError {
    /// Check if this error comes from the auth configuration.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::InvalidAuthScheme(_))
    }

    /// Check if this error was raised while talking to the transport.
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::InvalidUrl(_) | Self::InvalidHeader(_)
        )
    }
}
