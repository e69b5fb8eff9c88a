//! Terminal outcome of one authentication attempt

use serde_json::Value;

use crate::error::MagicLinkError;

pub const TOKEN_MISSING: &str = "token missing";
pub const NO_USER_FOUND: &str = "no user found";
pub const TOKEN_DELIVERED: &str = "token successfully delivered";

/// Exactly one of these is produced per invocation
#[derive(Debug)]
pub enum AuthOutcome {
    /// Token redeemed; carries the identity embedded at mint time
    Success(Value),
    /// Bad or missing caller input, optionally with a suggested HTTP status
    Fail {
        message: String,
        status: Option<u16>,
    },
    /// Token issued and handed to the provider; the user is not authenticated yet
    Pass { message: String },
    /// Unexpected failure in a callback, the signer, or the provider
    Error(MagicLinkError),
}

impl AuthOutcome {
    pub(crate) fn fail(message: impl Into<String>) -> Self {
        AuthOutcome::Fail {
            message: message.into(),
            status: None,
        }
    }

    pub(crate) fn fail_with_status(message: impl Into<String>, status: u16) -> Self {
        AuthOutcome::Fail {
            message: message.into(),
            status: Some(status),
        }
    }

    pub(crate) fn pass(message: impl Into<String>) -> Self {
        AuthOutcome::Pass {
            message: message.into(),
        }
    }

    /// Short name for logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            AuthOutcome::Success(_) => "success",
            AuthOutcome::Fail { .. } => "fail",
            AuthOutcome::Pass { .. } => "pass",
            AuthOutcome::Error(_) => "error",
        }
    }

    /// Authenticated identity, if any
    #[must_use]
    pub fn identity(&self) -> Option<&Value> {
        match self {
            AuthOutcome::Success(identity) => Some(identity),
            _ => None,
        }
    }

    /// Human readable message for `Fail` and `Pass`
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            AuthOutcome::Fail { message, .. } | AuthOutcome::Pass { message } => Some(message),
            _ => None,
        }
    }
}
