//! Transports that send built requests.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::{GraphQLError, Result, TransportRequest};

/// Sends a [`TransportRequest`] and returns the raw response.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// Raw transport response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Bytes,
}

impl TransportResponse {
    /// Create a response.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Check for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// HTTP transport backed by `reqwest`.
///
/// Recognised options: `http.timeout` in seconds and `ssl.verify_peer`.
/// Requests with `ssl.verify_peer = false` go through a second client that
/// accepts invalid certificates. Set it with
/// [`with_insecure_client`](Self::with_insecure_client) to keep custom client
/// settings; otherwise a default one is built per request.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
    insecure_client: Option<Client>,
}

impl HttpTransport {
    /// Create a transport with a default `reqwest` client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport around an existing client.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            insecure_client: None,
        }
    }

    /// Client used for requests with `ssl.verify_peer = false`.
    pub fn with_insecure_client(mut self, client: Client) -> Self {
        self.insecure_client = Some(client);
        self
    }

    fn client_for(&self, request: &TransportRequest) -> Result<Client> {
        let verify_peer = request
            .option("ssl", "verify_peer")
            .and_then(Value::as_bool)
            .unwrap_or(true);

        match (verify_peer, &self.insecure_client) {
            (true, _) => Ok(self.client.clone()),
            (false, Some(insecure)) => Ok(insecure.clone()),
            (false, None) => Ok(Client::builder().danger_accept_invalid_certs(true).build()?),
        }
    }
}

fn timeout_option(request: &TransportRequest) -> Option<Duration> {
    request
        .option("http", "timeout")
        .and_then(Value::as_f64)
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        .map(Duration::from_secs_f64)
}

fn split_header(line: &str) -> Result<(&str, &str)> {
    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| GraphQLError::InvalidHeader(line.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(GraphQLError::InvalidHeader(line.to_string()));
    }
    Ok((name, value.trim()))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let url = url::Url::parse(&request.url)
            .map_err(|e| GraphQLError::InvalidUrl(format!("{}: {}", request.url, e)))?;

        let client = self.client_for(&request)?;
        let mut http_request = client.request(request.method.clone(), url);

        for line in &request.headers {
            let (name, value) = split_header(line)?;
            http_request = http_request.header(name, value);
        }

        if let Some(timeout) = timeout_option(&request) {
            http_request = http_request.timeout(timeout);
        }

        debug!(url = %request.url, "Sending GraphQL request");

        let response = http_request.body(request.body).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        Ok(TransportResponse { status, body })
    }
}
