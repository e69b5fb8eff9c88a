//! Token delivery through an external prompt provider
//!
//! [`TokenDelivery`] turns a freshly minted token into a magic link and asks a
//! [`PromptClient`] to put it in front of the user. The client is injected so
//! the strategy never owns a global provider handle.

pub mod approve;

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::error::DeliveryError;
use crate::lookup::{lookup, scalar_to_string};

pub use approve::ApproveClient;

/// Label of the approve button shown in the prompt
pub const APPROVE_TEXT: &str = "Log In";

/// Body of a prompt creation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRequest {
    pub approve_redirect_url: String,
    pub approve_text: String,
    pub body: String,
    pub expires_in: u64,
    pub user: String,
}

/// Prompt as reported back by the provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub sent_at: Option<f64>,
    #[serde(default)]
    pub is_expired: Option<bool>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// Anything able to create a prompt for a user
#[async_trait]
pub trait PromptClient: Send + Sync {
    /// Create the prompt and return the provider's handle for it
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Rejected` when the provider refuses the prompt
    /// and `DeliveryError::Transport` when the call itself fails.
    async fn create_prompt(&self, request: &PromptRequest) -> Result<Prompt, DeliveryError>;

    /// Name used in logs
    fn provider_name(&self) -> &'static str;
}

/// Append `field=token` to `callback_url`, respecting an existing query string
#[must_use]
pub fn build_redirect_url(callback_url: &str, field: &str, token: &str) -> String {
    let separator = if callback_url.contains('?') { '&' } else { '?' };
    format!(
        "{callback_url}{separator}{field}={}",
        urlencoding::encode(token)
    )
}

/// Builds magic links and hands them to the prompt provider
#[derive(Clone)]
pub struct TokenDelivery {
    client: Arc<dyn PromptClient>,
    callback_url: String,
    token_field: String,
    contact_field: String,
    prompt_message: String,
    ttl_seconds: u64,
}

impl TokenDelivery {
    #[must_use]
    pub fn new(
        client: Arc<dyn PromptClient>,
        callback_url: impl Into<String>,
        token_field: impl Into<String>,
        contact_field: impl Into<String>,
        prompt_message: impl Into<String>,
        ttl_seconds: u64,
    ) -> Self {
        Self {
            client,
            callback_url: callback_url.into(),
            token_field: token_field.into(),
            contact_field: contact_field.into(),
            prompt_message: prompt_message.into(),
            ttl_seconds,
        }
    }

    /// Resolve the contact address from the user payload
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::MissingContact` when the field is absent or not
    /// a string/number.
    pub fn resolve_contact(&self, user: &Value) -> Result<String, DeliveryError> {
        lookup(user, &self.contact_field)
            .and_then(scalar_to_string)
            .ok_or_else(|| DeliveryError::MissingContact(self.contact_field.clone()))
    }

    /// Prompt the user with a magic link carrying `token`
    ///
    /// # Errors
    ///
    /// `DeliveryError::MissingContact` before any network call if the user
    /// payload has no usable contact, otherwise whatever the client reports.
    pub async fn deliver(&self, user: &Value, token: &str) -> Result<Prompt, DeliveryError> {
        let contact = self.resolve_contact(user)?;
        let request = PromptRequest {
            approve_redirect_url: build_redirect_url(&self.callback_url, &self.token_field, token),
            approve_text: APPROVE_TEXT.to_string(),
            body: self.prompt_message.clone(),
            expires_in: self.ttl_seconds,
            user: contact,
        };

        debug!(
            "Creating {} prompt (expires in {}s)",
            self.client.provider_name(),
            request.expires_in
        );
        self.client.create_prompt(&request).await
    }
}

impl std::fmt::Debug for TokenDelivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenDelivery")
            .field("provider", &self.client.provider_name())
            .field("callback_url", &self.callback_url)
            .field("contact_field", &self.contact_field)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}
