//! Magic link authentication strategy
//!
//! [`MagicLinkStrategy::authenticate`] dispatches every request to one of two
//! phases and always returns exactly one [`AuthOutcome`]:
//!
//! - **request token**: contact → verify user → mint → deliver → `Pass`
//! - **accept token**: token → verify → `Success`
//!
//! No state survives between invocations. The only shared pieces are the
//! immutable configuration and the injected collaborators, so the strategy can
//! be cloned freely across worker threads.

pub mod config;
pub mod outcome;
pub mod verify;

use log::{debug, error, info, warn};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::delivery::{ApproveClient, PromptClient, TokenDelivery};
use crate::error::{DeliveryError, MagicLinkError};
use crate::lookup::{lookup_first, lookup_present};
use crate::token::TokenCodec;

pub use config::{
    StrategyConfig, StrategyConfigBuilder, DEFAULT_TTL_SECONDS, MAX_TTL_SECONDS, TOKEN_FIELD,
};
pub use outcome::AuthOutcome;
pub use verify::{VerifyFn, VerifyUser};

/// Which phase of the flow a request belongs to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Action {
    /// Issue a token and deliver it to the user
    RequestToken,
    /// Redeem a token presented by the user
    #[default]
    AcceptToken,
}

impl Action {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Action::RequestToken => "requestToken",
            Action::AcceptToken => "acceptToken",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = MagicLinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requestToken" => Ok(Action::RequestToken),
            "acceptToken" => Ok(Action::AcceptToken),
            other => Err(MagicLinkError::UnknownAction(other.to_string())),
        }
    }
}

/// Request data the strategy reads from: a body and query parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthRequest {
    pub body: Value,
    pub query: Value,
}

impl AuthRequest {
    #[must_use]
    pub fn new(body: Value, query: Value) -> Self {
        Self { body, query }
    }

    #[must_use]
    pub fn from_body(body: Value) -> Self {
        Self::new(body, Value::Object(Map::new()))
    }

    #[must_use]
    pub fn from_query(query: Value) -> Self {
        Self::new(Value::Object(Map::new()), query)
    }

    /// Body first, then query
    fn field(&self, field_path: &str) -> Option<&Value> {
        lookup_first(&[&self.body, &self.query], field_path)
    }

    /// Like `field`, but a non-string value does not shadow the query
    fn string_field(&self, field_path: &str) -> Option<&str> {
        [&self.body, &self.query]
            .into_iter()
            .find_map(|container| lookup_present(container, field_path).and_then(Value::as_str))
    }
}

/// Per-invocation options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthOptions {
    /// Defaults to [`Action::AcceptToken`]
    pub action: Option<Action>,
    /// Replaces the default "no user found" message
    pub auth_message: Option<String>,
}

impl AuthOptions {
    #[must_use]
    pub fn request_token() -> Self {
        Self {
            action: Some(Action::RequestToken),
            auth_message: None,
        }
    }

    #[must_use]
    pub fn accept_token() -> Self {
        Self {
            action: Some(Action::AcceptToken),
            auth_message: None,
        }
    }

    #[must_use]
    pub fn with_auth_message(mut self, message: impl Into<String>) -> Self {
        self.auth_message = Some(message.into());
        self
    }
}

#[derive(Clone)]
pub struct MagicLinkStrategy {
    config: StrategyConfig,
    codec: TokenCodec,
    delivery: TokenDelivery,
    verify_user: Arc<dyn VerifyUser>,
}

impl MagicLinkStrategy {
    /// Strategy name as registered with the host framework
    pub const NAME: &'static str = "approveapi";

    #[must_use]
    pub fn new(
        config: StrategyConfig,
        prompt_client: Arc<dyn PromptClient>,
        verify_user: Arc<dyn VerifyUser>,
    ) -> Self {
        let codec = TokenCodec::new(config.api_key(), config.ttl_seconds());
        let delivery = TokenDelivery::new(
            prompt_client,
            config.callback_url(),
            config.token_field(),
            config.contact_field(),
            config.prompt_message(),
            config.ttl_seconds(),
        );

        Self {
            config,
            codec,
            delivery,
            verify_user,
        }
    }

    /// Build a strategy delivering through ApproveAPI with the configured key
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_approve_client(
        config: StrategyConfig,
        base_url: &str,
        timeout: Duration,
        verify_user: Arc<dyn VerifyUser>,
    ) -> Result<Self, DeliveryError> {
        let client = ApproveClient::with_options(config.api_key(), base_url, timeout)?;
        Ok(Self::new(config, Arc::new(client), verify_user))
    }

    #[must_use]
    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    #[must_use]
    pub fn token_codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Run one authentication attempt
    pub async fn authenticate(&self, request: &AuthRequest, options: &AuthOptions) -> AuthOutcome {
        let action = options.action.unwrap_or_default();
        let outcome = match action {
            Action::RequestToken => {
                self.request_token(request, options.auth_message.as_deref())
                    .await
            }
            Action::AcceptToken => self.accept_token(request),
        };

        if let AuthOutcome::Error(cause) = &outcome {
            error!("{action} failed unexpectedly: {cause}");
        } else {
            debug!("{action} finished with {}", outcome.kind());
        }
        outcome
    }

    /// Run one attempt with a free-form action string
    ///
    /// `None` selects the default action; an unrecognised value yields
    /// `AuthOutcome::Error` without touching the request.
    pub async fn authenticate_with_action(
        &self,
        request: &AuthRequest,
        action: Option<&str>,
        auth_message: Option<String>,
    ) -> AuthOutcome {
        let action = match action.map(Action::from_str).transpose() {
            Ok(action) => action,
            Err(e) => {
                error!("Rejecting authentication attempt: {e}");
                return AuthOutcome::Error(e);
            }
        };

        self.authenticate(
            request,
            &AuthOptions {
                action,
                auth_message,
            },
        )
        .await
    }

    async fn request_token(
        &self,
        request: &AuthRequest,
        auth_message: Option<&str>,
    ) -> AuthOutcome {
        let contact_field = self.config.contact_field();
        let Some(contact) = request.field(contact_field) else {
            warn!("Token request without contact field '{contact_field}'");
            return AuthOutcome::fail(MagicLinkError::ContactResolution.to_string());
        };

        let mut fields = Map::new();
        fields.insert(contact_field.to_string(), contact.clone());

        let user = match self.verify_user.verify_user(&fields).await {
            Ok(Some(user)) if !user.is_null() => user,
            Ok(_) => {
                info!("No user matched the supplied contact information");
                let message = auth_message.unwrap_or(outcome::NO_USER_FOUND);
                return AuthOutcome::fail_with_status(
                    MagicLinkError::UserNotFound(message.to_string()).to_string(),
                    400,
                );
            }
            Err(e) => return AuthOutcome::Error(MagicLinkError::VerificationCallback(e)),
        };

        let token = match self.codec.mint(&user) {
            Ok(token) => token,
            Err(e) => return AuthOutcome::Error(e.into()),
        };

        if let Err(e) = self.delivery.deliver(&user, &token).await {
            return AuthOutcome::Error(e.into());
        }

        info!(
            "Magic link token issued (valid for {}s)",
            self.codec.ttl_seconds()
        );
        AuthOutcome::pass(outcome::TOKEN_DELIVERED)
    }

    fn accept_token(&self, request: &AuthRequest) -> AuthOutcome {
        let Some(token) = request.string_field(self.config.token_field()) else {
            warn!("Token redemption without a token");
            return AuthOutcome::fail(outcome::TOKEN_MISSING);
        };

        match self.codec.verify(token) {
            Ok(identity) => {
                info!("Magic link token redeemed");
                AuthOutcome::Success(identity)
            }
            Err(e) => {
                let kind = if e.is_expired() { "expired" } else { "invalid" };
                warn!("Rejected {kind} magic link token: {e}");
                AuthOutcome::fail(e.to_string())
            }
        }
    }
}

impl fmt::Debug for MagicLinkStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MagicLinkStrategy")
            .field("config", &self.config)
            .field("delivery", &self.delivery)
            .finish_non_exhaustive()
    }
}
