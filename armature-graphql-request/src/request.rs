//! GraphQL request payload and transport descriptor.

use std::fmt;

use http::Method;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::Result;

/// How the stored query text is wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    /// Wrapped as `query {...}`.
    Query,
    /// Wrapped as `mutation {...}`.
    Mutation,
    /// Sent as given; the text is a complete document.
    Raw,
}

impl QueryType {
    /// Lower-case name of the query type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Raw => "raw",
        }
    }

    /// Produce the query document for `text`.
    pub fn wrap(&self, text: &str) -> String {
        match self {
            Self::Query | Self::Mutation => format!("{} {{{}}}", self.as_str(), text),
            Self::Raw => text.to_string(),
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// GraphQL request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphQLPayload {
    /// The full query document.
    pub query: String,
    /// Variables for the operation.
    pub variables: Map<String, Value>,
}

/// A request ready to be handed to a [`Transport`](crate::Transport).
#[derive(Debug, Clone, Serialize)]
pub struct TransportRequest {
    /// HTTP method; always `POST` for built requests.
    #[serde(serialize_with = "serialize_method")]
    pub method: Method,
    /// Target URL.
    pub url: String,
    /// Header lines in `Name: value` form, in send order.
    pub headers: Vec<String>,
    /// Encoded JSON body.
    #[serde(serialize_with = "serialize_body")]
    pub body: Vec<u8>,
    /// Transport options such as `{"http": {"timeout": 30}}`.
    pub options: Map<String, Value>,
}

impl TransportRequest {
    /// Decode the body as JSON.
    pub fn body_json(&self) -> Result<Value> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Look up `options[section][key]`.
    pub fn option(&self, section: &str, key: &str) -> Option<&Value> {
        self.options.get(section)?.get(key)
    }
}

fn serialize_method<S: Serializer>(method: &Method, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(method.as_str())
}

fn serialize_body<S: Serializer>(body: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(body))
}
