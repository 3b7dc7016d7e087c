//! GraphQL request builder.

use std::sync::Arc;

use http::Method;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::mutator::{Accessor, Mutator};
use crate::{
    ConfigProvider, GraphQLClientConfig, GraphQLPayload, QueryType, Result, Transport,
    TransportRequest,
};

/// User agent sent with every request.
pub const USER_AGENT: &str = "Armature GraphQL client";

/// Content type sent with every request.
pub const CONTENT_TYPE: &str = "application/json";

/// Response representation returned by [`GraphQLClient::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Raw JSON text.
    Json,
    /// Decoded JSON value.
    #[default]
    Value,
}

/// Response body in the requested [`Format`].
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePayload {
    /// Raw JSON text.
    Json(String),
    /// Decoded JSON value.
    Value(Value),
}

/// Fluent GraphQL request builder.
///
/// Setters consume and return the builder. Derived attributes
/// ([`raw_query`](Self::raw_query), [`headers`](Self::headers),
/// [`request`](Self::request)) are recomputed from the current state on each
/// call, and auth settings are read from the [`ConfigProvider`] every time.
#[derive(Clone)]
pub struct GraphQLClient {
    config: Arc<dyn ConfigProvider>,
    endpoint: String,
    query_type: Option<QueryType>,
    query: String,
    variables: Map<String, Value>,
    headers: Vec<String>,
    context: Map<String, Value>,
}

impl GraphQLClient {
    /// Create a client for `endpoint` with the default configuration.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_config(GraphQLClientConfig::default()).endpoint(endpoint)
    }

    /// Create a client from a configuration provider.
    pub fn with_config(config: impl ConfigProvider + 'static) -> Self {
        Self::with_provider(Arc::new(config))
    }

    /// Create a client from a shared configuration provider.
    pub fn with_provider(config: Arc<dyn ConfigProvider>) -> Self {
        Self {
            endpoint: config.endpoint(),
            config,
            query_type: None,
            query: String::new(),
            variables: Map::new(),
            headers: Vec::new(),
            context: Map::new(),
        }
    }

    /// Set a query; the text is wrapped as `query {...}`.
    pub fn query(self, query: impl Into<String>) -> Self {
        self.set_query(QueryType::Query, query)
    }

    /// Set a mutation; the text is wrapped as `mutation {...}`.
    pub fn mutation(self, mutation: impl Into<String>) -> Self {
        self.set_query(QueryType::Mutation, mutation)
    }

    /// Set a complete query document that is sent unchanged.
    pub fn raw(self, document: impl Into<String>) -> Self {
        self.set_query(QueryType::Raw, document)
    }

    fn set_query(mut self, query_type: QueryType, text: impl Into<String>) -> Self {
        self.query_type = Some(query_type);
        self.query = text.into();
        self
    }

    /// Merge variables; existing names are overwritten.
    ///
    /// Anything that does not serialize to a JSON object is ignored.
    pub fn with(mut self, variables: impl Serialize) -> Self {
        if let Some(variables) = into_object(variables, "variables") {
            self.variables.extend(variables);
        }
        self
    }

    /// Add a header. Duplicate names are kept.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.headers
            .push(format!("{}: {}", name.as_ref(), value.as_ref()));
        self
    }

    /// Add several headers in iteration order.
    pub fn with_headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        headers
            .into_iter()
            .fold(self, |client, (name, value)| client.header(name, value))
    }

    /// Replace the transport options.
    ///
    /// Anything that does not serialize to a JSON object is ignored.
    pub fn context(mut self, context: impl Serialize) -> Self {
        if let Some(context) = into_object(context, "context") {
            self.context = context;
        }
        self
    }

    /// Replace the endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Current endpoint.
    pub fn get_endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Query type chosen by the last `query`/`mutation`/`raw` call.
    pub fn query_type(&self) -> Option<QueryType> {
        self.query_type
    }

    /// Stored query text, without wrapping.
    pub fn query_text(&self) -> &str {
        &self.query
    }

    /// Variable bag.
    pub fn variables(&self) -> &Map<String, Value> {
        &self.variables
    }

    /// Transport options.
    pub fn get_context(&self) -> &Map<String, Value> {
        &self.context
    }

    /// The query document to send. Empty before a query type is chosen.
    pub fn raw_query(&self) -> String {
        self.query_type
            .map(|query_type| query_type.wrap(&self.query))
            .unwrap_or_default()
    }

    /// All header lines: defaults, then auth, then added headers.
    ///
    /// # Errors
    ///
    /// [`GraphQLError::InvalidAuthScheme`](crate::GraphQLError::InvalidAuthScheme)
    /// when credentials are set and the scheme is unknown.
    pub fn headers(&self) -> Result<Vec<String>> {
        let mut headers = vec![
            format!("Content-Type: {}", CONTENT_TYPE),
            format!("User-Agent: {}", USER_AGENT),
        ];

        if let Some(auth) = self.config.auth_config().resolve()? {
            headers.push(auth);
        }

        headers.extend(self.headers.iter().cloned());
        Ok(headers)
    }

    /// Request body.
    pub fn payload(&self) -> GraphQLPayload {
        GraphQLPayload {
            query: self.raw_query(),
            variables: self.variables.clone(),
        }
    }

    /// Build the transport descriptor without sending it.
    pub fn request(&self) -> Result<TransportRequest> {
        let headers = self.headers()?;
        let body = serde_json::to_vec(&self.payload())?;

        debug!(
            endpoint = %self.endpoint,
            query_type = ?self.query_type,
            variables = self.variables.len(),
            "Built GraphQL request"
        );

        Ok(TransportRequest {
            method: Method::POST,
            url: self.endpoint.clone(),
            headers,
            body,
            options: self.context.clone(),
        })
    }

    /// Send the request and return the body in the given format.
    ///
    /// The response status is not inspected. With [`Format::Value`] a body
    /// that is not JSON, such as an HTML error page, decodes to `Value::Null`.
    pub async fn send(&self, transport: &dyn Transport, format: Format) -> Result<ResponsePayload> {
        let response = transport.send(self.request()?).await?;

        if !response.is_success() {
            warn!(status = response.status, endpoint = %self.endpoint, "GraphQL endpoint returned non-success status");
        }

        match format {
            Format::Json => Ok(ResponsePayload::Json(response.text())),
            Format::Value => match serde_json::from_slice(&response.body) {
                Ok(value) => Ok(ResponsePayload::Value(value)),
                Err(e) => {
                    warn!(status = response.status, error = %e, "Response body is not JSON");
                    Ok(ResponsePayload::Value(Value::Null))
                }
            },
        }
    }

    fn raw_query_attribute(&self) -> Result<Value> {
        Ok(Value::String(self.raw_query()))
    }

    fn headers_attribute(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.headers()?)?)
    }

    fn payload_attribute(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.payload())?)
    }

    fn request_attribute(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.request()?)?)
    }
}

fn into_object(value: impl Serialize, what: &str) -> Option<Map<String, Value>> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Some(map),
        Ok(other) => {
            warn!(kind = what, value = %other, "Ignoring non-object value");
            None
        }
        Err(e) => {
            warn!(kind = what, error = %e, "Ignoring value that failed to serialize");
            None
        }
    }
}

impl Mutator for GraphQLClient {
    const FIELDS: &'static [&'static str] = &[
        "endpoint",
        "query",
        "queryType",
        "variables",
        "headers",
        "context",
    ];

    const ACCESSORS: &'static [(&'static str, Accessor<Self>)] = &[
        ("raw_query", GraphQLClient::raw_query_attribute),
        ("headers", GraphQLClient::headers_attribute),
        ("payload", GraphQLClient::payload_attribute),
        ("request", GraphQLClient::request_attribute),
    ];

    fn assign_field(&mut self, field: &str, value: Value) -> Result<()> {
        match field {
            "endpoint" => self.endpoint = serde_json::from_value(value)?,
            "query" => self.query = serde_json::from_value(value)?,
            "queryType" => self.query_type = Some(serde_json::from_value(value)?),
            "variables" => self.variables = serde_json::from_value(value)?,
            "context" => self.context = serde_json::from_value(value)?,
            "headers" => {
                let headers: Map<String, Value> = serde_json::from_value(value)?;
                for (name, value) in headers {
                    let value = match value {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    self.headers.push(format!("{}: {}", name, value));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn variables_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.variables
    }
}

impl Default for GraphQLClient {
    fn default() -> Self {
        Self::with_config(GraphQLClientConfig::default())
    }
}

impl std::fmt::Debug for GraphQLClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQLClient")
            .field("endpoint", &self.endpoint)
            .field("query_type", &self.query_type)
            .field("query", &self.query)
            .field("variables", &self.variables)
            .field("headers", &self.headers)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GraphQLError, SharedConfig, TransportResponse};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    fn client() -> GraphQLClient {
        GraphQLClient::new("https://api.example.com/graphql")
    }

    fn auth_client(credentials: &str, scheme: &str, header: &str) -> GraphQLClient {
        let config = GraphQLClientConfig::builder()
            .endpoint("https://api.example.com/graphql")
            .credentials(credentials)
            .scheme(scheme)
            .header(header)
            .build();
        GraphQLClient::with_config(config)
    }

    struct HtmlTransport;

    #[async_trait]
    impl Transport for HtmlTransport {
        async fn send(&self, _request: TransportRequest) -> Result<TransportResponse> {
            Ok(TransportResponse::new(502, "<html>Bad Gateway</html>"))
        }
    }

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<TransportRequest>>,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
            self.sent.lock().push(request);
            Ok(TransportResponse::new(200, r#"{"data":{"users":[]}}"#))
        }
    }

    #[test]
    fn test_client_creation() {
        let client = client();
        assert_eq!(client.get_endpoint(), "https://api.example.com/graphql");
        assert_eq!(client.query_type(), None);
        assert_eq!(client.raw_query(), "");
    }

    #[test]
    fn test_endpoint_from_config() {
        let client = GraphQLClient::with_config(GraphQLClientConfig::new("https://cfg.example.com"));
        assert_eq!(client.get_endpoint(), "https://cfg.example.com");

        let client = client.endpoint("https://other.example.com");
        assert_eq!(client.get_endpoint(), "https://other.example.com");
    }

    #[test]
    fn test_query_types() {
        let client = client().query("users { id }");
        assert_eq!(client.query_type(), Some(QueryType::Query));
        assert_eq!(client.raw_query(), "query {users { id }}");

        let client = client.mutation("createUser { id }");
        assert_eq!(client.query_type(), Some(QueryType::Mutation));
        assert_eq!(client.raw_query(), "mutation {createUser { id }}");

        let client = client.raw("query { users { id name } }");
        assert_eq!(client.query_type(), Some(QueryType::Raw));
        assert_eq!(client.raw_query(), "query { users { id name } }");
    }

    #[test]
    fn test_with_merges_variables() {
        let client = client()
            .with(json!({"id": 1, "name": "John"}))
            .with(json!({"name": "Jane", "active": true}));

        assert_eq!(
            Value::Object(client.variables().clone()),
            json!({"id": 1, "name": "Jane", "active": true})
        );
    }

    #[test]
    fn test_with_ignores_non_objects() {
        let client = client().with(json!({"id": 1})).with(vec![1, 2, 3]);
        assert_eq!(Value::Object(client.variables().clone()), json!({"id": 1}));
    }

    #[test]
    fn test_context_replaces() {
        let client = client()
            .context(json!({"ssl": {"verify_peer": false}}))
            .context(json!({"http": {"timeout": 30}}));

        assert_eq!(
            Value::Object(client.get_context().clone()),
            json!({"http": {"timeout": 30}})
        );
    }

    #[test]
    fn test_default_headers_first() {
        let headers = client().headers().unwrap();
        assert_eq!(
            headers,
            vec![
                "Content-Type: application/json".to_string(),
                "User-Agent: Armature GraphQL client".to_string(),
            ]
        );
    }

    #[test]
    fn test_header_order_and_duplicates() {
        let client = auth_client("tok123", "bearer", "Authorization")
            .header("X-Trace", "1")
            .with_headers([("X-Trace", "2"), ("X-Other", "3")]);

        assert_eq!(
            client.headers().unwrap(),
            vec![
                "Content-Type: application/json",
                "User-Agent: Armature GraphQL client",
                "Authorization: Bearer tok123",
                "X-Trace: 1",
                "X-Trace: 2",
                "X-Other: 3",
            ]
        );
    }

    #[test]
    fn test_custom_scheme_header() {
        let client = auth_client("key1", "custom", "X-API-Key");
        assert!(client.headers().unwrap().contains(&"X-API-Key: key1".to_string()));
    }

    #[test]
    fn test_invalid_scheme_fails_headers_and_request() {
        let client = auth_client("token", "ghost", "Authorization").query("users { id }");

        assert!(matches!(
            client.headers(),
            Err(GraphQLError::InvalidAuthScheme(ref s)) if s == "ghost"
        ));
        assert!(client.request().is_err());
    }

    #[test]
    fn test_auth_is_read_on_every_access() {
        let shared = SharedConfig::new(GraphQLClientConfig::default());
        let client = GraphQLClient::with_config(shared.clone());
        assert_eq!(client.headers().unwrap().len(), 2);

        shared.update(|config| config.auth_credentials = Some("late".to_string()));
        assert_eq!(
            client.headers().unwrap().last().map(String::as_str),
            Some("Authorization: Bearer late")
        );

        shared.update(|config| config.auth_scheme = "ghost".to_string());
        assert!(client.headers().is_err());
    }

    #[test]
    fn test_request_descriptor() {
        let client = client()
            .query("users { id }")
            .with(json!({"limit": 10}))
            .context(json!({"http": {"timeout": 30}}));

        let request = client.request().unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.url, "https://api.example.com/graphql");
        assert_eq!(
            String::from_utf8(request.body.clone()).unwrap(),
            r#"{"query":"query {users { id }}","variables":{"limit":10}}"#
        );
        assert_eq!(request.headers, client.headers().unwrap());
        assert_eq!(request.option("http", "timeout"), Some(&json!(30)));
    }

    #[test]
    fn test_dynamic_with_variables() {
        let client = client()
            .query("users { id name }")
            .call("withUserId", 123)
            .and_then(|c| c.call("withUserName", "John Doe"))
            .and_then(|c| c.call("withIsActive", true))
            .unwrap();

        assert_eq!(
            Value::Object(client.variables().clone()),
            json!({"userId": 123, "userName": "John Doe", "isActive": true})
        );
    }

    #[test]
    fn test_dynamic_with_declared_fields() {
        let client = client()
            .call("withEndpoint", "https://dynamic.example.com")
            .and_then(|c| c.call("withContext", json!({"ssl": {"verify_peer": false}})))
            .unwrap();

        assert_eq!(client.get_endpoint(), "https://dynamic.example.com");
        assert_eq!(client.get_context()["ssl"]["verify_peer"], json!(false));
        assert!(client.variables().is_empty());
    }

    #[test]
    fn test_dynamic_with_query_type() {
        let client = client()
            .query("a")
            .call("withQueryType", "raw")
            .unwrap();

        assert_eq!(client.query_type(), Some(QueryType::Raw));
        assert_eq!(client.raw_query(), "a");
        assert!(client.variables().is_empty());
        assert_eq!(
            client.request().unwrap().body_json().unwrap(),
            json!({"query": "a", "variables": {}})
        );

        let err = client.call("withQueryType", "subscription").unwrap_err();
        assert!(matches!(err, GraphQLError::Json(_)));
    }

    #[test]
    fn test_dynamic_with_headers() {
        let client = client()
            .header("X-First", "0")
            .call("withHeaders", json!({"X-A": "1", "X-B": 2}))
            .unwrap();

        assert!(client.variables().is_empty());
        assert_eq!(
            client.headers().unwrap()[2..],
            ["X-First: 0", "X-A: 1", "X-B: 2"]
        );

        let err = client.call("withHeaders", "X-C: 3").unwrap_err();
        assert!(matches!(err, GraphQLError::Json(_)));
    }

    #[test]
    fn test_dynamic_field_type_mismatch() {
        let err = client().call("withEndpoint", 42).unwrap_err();
        assert!(matches!(err, GraphQLError::Json(_)));
    }

    #[test]
    fn test_dynamic_unsupported_method() {
        let err = client().call("doThing", ()).unwrap_err();
        assert!(matches!(err, GraphQLError::UnsupportedOperation(ref m) if m == "doThing"));
    }

    #[test]
    fn test_computed_attributes() {
        let client = client().mutation("createUser { id }");

        assert_eq!(
            client.attribute("raw_query").unwrap(),
            Some(json!("mutation {createUser { id }}"))
        );
        assert_eq!(
            client.attribute("headers").unwrap(),
            Some(json!([
                "Content-Type: application/json",
                "User-Agent: Armature GraphQL client"
            ]))
        );
        let request = client.attribute("request").unwrap().unwrap();
        assert_eq!(request["method"], "POST");
        assert_eq!(client.attribute("unknown").unwrap(), None);
    }

    #[test]
    fn test_send_formats() {
        let transport = RecordingTransport::default();
        let client = client().query("users { id }");

        let value = tokio_test::block_on(client.send(&transport, Format::Value)).unwrap();
        assert_eq!(value, ResponsePayload::Value(json!({"data": {"users": []}})));

        let text = tokio_test::block_on(client.send(&transport, Format::Json)).unwrap();
        assert_eq!(text, ResponsePayload::Json(r#"{"data":{"users":[]}}"#.to_string()));

        let sent = transport.sent.lock();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].url, "https://api.example.com/graphql");
    }

    #[test]
    fn test_send_non_json_body_decodes_to_null() {
        let client = client().query("users { id }");

        let value = tokio_test::block_on(client.send(&HtmlTransport, Format::Value)).unwrap();
        assert_eq!(value, ResponsePayload::Value(Value::Null));

        let text = tokio_test::block_on(client.send(&HtmlTransport, Format::Json)).unwrap();
        assert_eq!(text, ResponsePayload::Json("<html>Bad Gateway</html>".to_string()));
    }
}
