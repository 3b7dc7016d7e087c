//! # Armature GraphQL Request
//!
//! A fluent builder that assembles GraphQL HTTP requests and resolves the auth
//! header from configuration.
//!
//! ## Features
//!
//! - **Fluent builder**: queries, mutations and raw documents with variables,
//!   headers and transport options
//! - **Config-driven auth**: scheme table lookup with optional prefixes
//! - **Dynamic setters**: `withUserId`-style calls through [`Mutator`]
//! - **Pluggable transport**: send with [`HttpTransport`] or any [`Transport`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use armature_graphql_request::{Format, GraphQLClient, GraphQLClientConfig, HttpTransport};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GraphQLClientConfig::builder()
//!         .endpoint("https://api.example.com/graphql")
//!         .bearer_auth("token123")
//!         .build();
//!
//!     let response = GraphQLClient::with_config(config)
//!         .query("users(first: $limit) { id name }")
//!         .with(json!({ "limit": 10 }))
//!         .header("X-Request-ID", "abc")
//!         .send(&HttpTransport::new(), Format::Value)
//!         .await?;
//!
//!     println!("{:?}", response);
//!     Ok(())
//! }
//! ```
//!
//! ## Dynamic Setters
//!
//! ```rust,ignore
//! use armature_graphql_request::{GraphQLClient, Mutator};
//!
//! let client = GraphQLClient::new("https://api.example.com/graphql")
//!     .query("user(id: $userId) { name }")
//!     .call("withUserId", 123)?;
//!
//! assert_eq!(client.variables()["userId"], 123);
//! ```

mod auth;
mod client;
mod config;
mod error;
pub mod mutator;
mod request;
mod transport;

pub use auth::AuthConfig;
pub use client::{CONTENT_TYPE, Format, GraphQLClient, ResponsePayload, USER_AGENT};
pub use config::{ConfigProvider, GraphQLClientConfig, GraphQLClientConfigBuilder, SharedConfig};
pub use error::{GraphQLError, Result};
pub use mutator::Mutator;
pub use request::{GraphQLPayload, QueryType, TransportRequest};
pub use transport::{HttpTransport, Transport, TransportResponse};

// Re-export common types
pub use serde_json::Value as JsonValue;
