// ApproveAPI prompt client
use async_trait::async_trait;
use log::{debug, warn};
use std::time::Duration;

use super::{Prompt, PromptClient, PromptRequest};
use crate::error::DeliveryError;

/// Public ApproveAPI endpoint
pub const DEFAULT_BASE_URL: &str = "https://approve.sh";

/// Default timeout for a single prompt creation call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// `reqwest`-backed [`PromptClient`] talking to ApproveAPI
///
/// Authenticates with HTTP basic auth, the API key being the username.
#[derive(Clone)]
pub struct ApproveClient {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ApproveClient {
    /// Create a client for the public ApproveAPI endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, DeliveryError> {
        Self::with_options(api_key, DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Create a client for a custom endpoint and timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_options(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DeliveryError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn prompt_url(&self) -> String {
        format!("{}/prompt", self.base_url)
    }
}

#[async_trait]
impl PromptClient for ApproveClient {
    async fn create_prompt(&self, request: &PromptRequest) -> Result<Prompt, DeliveryError> {
        let url = self.prompt_url();
        debug!("Sending prompt request to {url}");

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.api_key, Some(""))
            .json(request)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(format!("failed to reach {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("ApproveAPI rejected prompt with status {status}");
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let prompt: Prompt = response
            .json()
            .await
            .map_err(|e| {
                DeliveryError::Transport(format!("failed to parse prompt response: {e}"))
            })?;

        debug!("ApproveAPI prompt {} created", prompt.id);
        Ok(prompt)
    }

    fn provider_name(&self) -> &'static str {
        "approveapi"
    }
}

impl std::fmt::Debug for ApproveClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApproveClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
