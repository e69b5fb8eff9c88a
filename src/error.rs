//! Error types for the magic link flow
//!
//! Construction problems surface as [`ConfigError`] before any request is
//! handled. Everything that can go wrong while a request is processed is a
//! [`MagicLinkError`]; the strategy turns those into `Fail` or `Error`
//! outcomes and never lets them escape.

use thiserror::Error;

/// Strategy configuration errors, raised once at construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required option was not supplied or was empty
    #[error("magic link strategy requires {0}")]
    MissingRequired(&'static str),

    /// An option was supplied but cannot be used
    #[error("invalid configuration value for '{key}': {message}")]
    InvalidValue { key: &'static str, message: String },
}

/// Token signing and verification errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The secret is unusable or the payload could not be encoded
    #[error("token signing failed: {0}")]
    Signing(String),

    /// Malformed token, bad signature, or any decode failure
    #[error("invalid token: {0}")]
    Invalid(String),

    /// Signature is valid but the token is past its expiration
    #[error("token expired at {expired_at}")]
    Expired { expired_at: i64 },
}

impl TokenError {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(self, TokenError::Expired { .. })
    }
}

/// Errors raised while handing a token to the prompt provider
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The contact field could not be resolved from the user payload
    #[error("unable to parse the contact field '{0}' from the given user")]
    MissingContact(String),

    /// The provider answered with a non-success status
    #[error("prompt provider rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The request never produced a usable response
    #[error("prompt request failed: {0}")]
    Transport(String),
}

/// Every failure the strategy can hit while handling a request
#[derive(Debug, Error)]
pub enum MagicLinkError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Contact information missing from both body and query
    #[error("contact information missing")]
    ContactResolution,

    /// The application's verify-user callback failed
    #[error("verify user callback failed: {0}")]
    VerificationCallback(anyhow::Error),

    /// The verify-user callback found nobody for the given fields
    #[error("{0}")]
    UserNotFound(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// An action string outside `requestToken` / `acceptToken`
    #[error("unknown action: {0}")]
    UnknownAction(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired("an ApproveAPI key");
        assert_eq!(err.to_string(), "magic link strategy requires an ApproveAPI key");
    }

    #[test]
    fn test_token_error_kinds_are_distinguishable() {
        let expired = TokenError::Expired { expired_at: 10 };
        let invalid = TokenError::Invalid("invalid signature".to_string());

        assert!(expired.is_expired());
        assert!(!invalid.is_expired());
        assert!(expired.to_string().contains("expired"));
    }

    #[test]
    fn test_magic_link_error_from_delivery() {
        let err: MagicLinkError = DeliveryError::MissingContact("email".to_string()).into();
        assert!(matches!(
            err,
            MagicLinkError::Delivery(DeliveryError::MissingContact(_))
        ));
        assert_eq!(
            err.to_string(),
            "unable to parse the contact field 'email' from the given user"
        );
    }
}
