//! HTTP transport for the document API.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, trace};

use crate::config::ApiConfig;
use crate::error::Result;

/// Status and body of a transport response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    /// The API answers 200 or 201 on success.
    pub fn is_accepted(&self) -> bool {
        matches!(self.status, 200 | 201)
    }
}

/// Trait for sending serialized document requests.
///
/// This abstracts the network call so the client can be driven by
/// [`HttpTransport`] in production and by in-memory transports in tests.
#[async_trait]
pub trait DocumentTransport: Send + Sync {
    /// Post a JSON body to the document endpoint.
    ///
    /// Non-success statuses are returned as responses, not errors; only
    /// failures to complete the exchange are errors.
    async fn post_json(&self, body: String) -> Result<TransportResponse>;
}

/// [`DocumentTransport`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpTransport {
    /// Create a transport from API settings.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self::with_client(client, config))
    }

    /// Create a transport over a preconfigured client.
    ///
    /// `config.timeout_ms` is ignored; the client's own timeout applies.
    pub fn with_client(client: Client, config: &ApiConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            token: config.token.clone(),
        }
    }

    /// Get the endpoint URL requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl DocumentTransport for HttpTransport {
    async fn post_json(&self, body: String) -> Result<TransportResponse> {
        trace!(endpoint = %self.endpoint, bytes = body.len(), "Posting document");

        let mut request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body);

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!(status = status, "Document endpoint responded");
        Ok(TransportResponse { status, body })
    }
}
