//! Rate-limited document submission client.

use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::document::CreateDocumentRequest;
use super::transport::{DocumentTransport, HttpTransport};
use crate::config::{ApiConfig, CrptConfig};
use crate::error::{CrptError, Result};
use crate::ratelimit::{SlidingWindowLimiter, TimeUnit};

/// Client for the CRPT document creation API.
///
/// Every submission takes a permit from the shared limiter before touching
/// the network. A permit is spent once admitted, whether or not the remote
/// call later succeeds, so the limiter caps attempts rather than successes.
pub struct CrptApi<T: DocumentTransport = HttpTransport> {
    transport: T,
    limiter: Arc<SlidingWindowLimiter>,
}

impl CrptApi<HttpTransport> {
    /// Create a client for the default endpoint that allows at most
    /// `request_limit` calls per `unit`.
    pub fn new(unit: TimeUnit, request_limit: i64) -> Result<Self> {
        let limiter = SlidingWindowLimiter::new(unit, request_limit)?;
        let transport = HttpTransport::new(&ApiConfig::default())?;
        Ok(Self::with_transport(transport, Arc::new(limiter)))
    }

    /// Create a client from a full configuration.
    pub fn from_config(config: &CrptConfig) -> Result<Self> {
        let limiter = config.rate_limit.build_limiter()?;
        let transport = HttpTransport::new(&config.api)?;
        Ok(Self::with_transport(transport, Arc::new(limiter)))
    }
}

impl<T: DocumentTransport> CrptApi<T> {
    /// Create a client over an arbitrary transport and a possibly shared limiter.
    pub fn with_transport(transport: T, limiter: Arc<SlidingWindowLimiter>) -> Self {
        Self { transport, limiter }
    }

    /// Get the limiter guarding this client.
    pub fn limiter(&self) -> &Arc<SlidingWindowLimiter> {
        &self.limiter
    }

    /// Submit a signed document, waiting for a permit if the limit is reached.
    pub async fn create_document<D>(&self, document: &D, signature: &str) -> Result<()>
    where
        D: Serialize + Sync,
    {
        self.create_document_until(document, signature, std::future::pending())
            .await
    }

    /// Submit a signed document, abandoning the wait for a permit with
    /// [`CrptError::Interrupted`] if `interrupt` resolves first.
    ///
    /// Once a permit is granted the request is sent; `interrupt` is not
    /// observed during the network call.
    #[instrument(
        skip(self, document, signature, interrupt),
        fields(request_id = %uuid::Uuid::new_v4())
    )]
    pub async fn create_document_until<D, F>(
        &self,
        document: &D,
        signature: &str,
        interrupt: F,
    ) -> Result<()>
    where
        D: Serialize + Sync,
        F: Future<Output = ()> + Send,
    {
        if signature.is_empty() {
            warn!("Rejecting document with empty signature");
            return Err(CrptError::InvalidRequest(
                "signature must not be empty".to_string(),
            ));
        }

        let body = CreateDocumentRequest::new(document, signature).to_json()?;

        self.limiter.acquire_until(interrupt).await?;

        let response = self.transport.post_json(body).await?;
        if !response.is_accepted() {
            warn!(status = response.status, "Document submission rejected");
            return Err(CrptError::RemoteCallFailed {
                status: response.status,
                body: response.body,
            });
        }

        info!(status = response.status, "Document submitted");
        Ok(())
    }
}
