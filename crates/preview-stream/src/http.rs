use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::errors::{PreviewError, ProviderError};
use crate::request::GenerateRequest;
use crate::transport::{ChunkStream, Transport, chunk_stream};

/// `Transport` that POSTs the request body and streams the response.
pub struct HttpTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpTransport {
    /// Creates a transport from explicit client configuration.
    pub fn new(config: ClientConfig) -> Result<Self, PreviewError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PreviewError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Creates a transport from `ClientConfig::from_env`.
    pub fn from_env() -> Result<Self, PreviewError> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn open(&self, request: &GenerateRequest) -> Result<ChunkStream, ProviderError> {
        let body = request.to_body(self.config.model.as_deref());
        debug!(target_id = %request.target_id, endpoint = %self.config.endpoint, "opening generation stream");

        let mut http_req = self.client.post(&self.config.endpoint).json(&body);
        if let Some(token) = self.config.token.as_deref() {
            http_req = http_req.bearer_auth(token);
        }

        let response = http_req
            .send()
            .await
            .map_err(|e| ProviderError::transport(format!("generation request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            warn!(target_id = %request.target_id, status = status.as_u16(), "generation request rejected");
            return Err(ProviderError::status(
                status.as_u16(),
                format!("generation request failed with status {status}"),
            ));
        }

        Ok(chunk_stream(response.bytes_stream()))
    }
}
