//! Validated strategy configuration
//!
//! Every required option is checked once by [`StrategyConfigBuilder::build`];
//! a built [`StrategyConfig`] is immutable for the lifetime of the strategy.

use std::fmt;

use crate::error::ConfigError;

/// Default token lifetime: ten minutes
pub const DEFAULT_TTL_SECONDS: u64 = 600;

/// Longest accepted token lifetime: thirty days
pub const MAX_TTL_SECONDS: u64 = 30 * 24 * 60 * 60;

/// Request field carrying the token, both in the magic link and on redemption
pub const TOKEN_FIELD: &str = "token";

#[derive(Clone, PartialEq, Eq)]
pub struct StrategyConfig {
    api_key: String,
    callback_url: String,
    contact_field: String,
    prompt_message: String,
    ttl_seconds: u64,
}

impl StrategyConfig {
    #[must_use]
    pub fn builder() -> StrategyConfigBuilder {
        StrategyConfigBuilder::default()
    }

    /// Secret used to sign tokens and to authenticate against the provider
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    #[must_use]
    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    #[must_use]
    pub fn contact_field(&self) -> &str {
        &self.contact_field
    }

    #[must_use]
    pub fn prompt_message(&self) -> &str {
        &self.prompt_message
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    #[must_use]
    pub fn token_field(&self) -> &'static str {
        TOKEN_FIELD
    }
}

impl fmt::Debug for StrategyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyConfig")
            .field("api_key", &"<redacted>")
            .field("callback_url", &self.callback_url)
            .field("contact_field", &self.contact_field)
            .field("prompt_message", &self.prompt_message)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

/// Fluent builder for [`StrategyConfig`]
#[derive(Debug, Default, Clone)]
pub struct StrategyConfigBuilder {
    api_key: Option<String>,
    callback_url: Option<String>,
    contact_field: Option<String>,
    prompt_message: Option<String>,
    ttl_seconds: Option<u64>,
}

impl StrategyConfigBuilder {
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    #[must_use]
    pub fn callback_url(mut self, callback_url: impl Into<String>) -> Self {
        self.callback_url = Some(callback_url.into());
        self
    }

    #[must_use]
    pub fn contact_field(mut self, contact_field: impl Into<String>) -> Self {
        self.contact_field = Some(contact_field.into());
        self
    }

    #[must_use]
    pub fn prompt_message(mut self, prompt_message: impl Into<String>) -> Self {
        self.prompt_message = Some(prompt_message.into());
        self
    }

    #[must_use]
    pub fn ttl_seconds(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = Some(ttl_seconds);
        self
    }

    /// Validate and freeze the configuration
    ///
    /// # Errors
    ///
    /// - `ConfigError::MissingRequired` if an option is missing or blank
    /// - `ConfigError::InvalidValue` if the callback URL is neither an
    ///   absolute URL nor a `/`-rooted path, or the TTL is zero or above
    ///   [`MAX_TTL_SECONDS`]
    pub fn build(self) -> Result<StrategyConfig, ConfigError> {
        let api_key = required(self.api_key, "an ApproveAPI key")?;
        let callback_url = required(self.callback_url, "a callback URL")?;
        let contact_field = required(self.contact_field, "a contact field")?;
        let prompt_message = required(self.prompt_message, "a login prompt message")?;

        check_callback_url(&callback_url)?;

        let ttl_seconds = self.ttl_seconds.unwrap_or(DEFAULT_TTL_SECONDS);
        if ttl_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                key: "ttl",
                message: "must be greater than zero".to_string(),
            });
        }
        if ttl_seconds > MAX_TTL_SECONDS {
            return Err(ConfigError::InvalidValue {
                key: "ttl",
                message: format!("must not exceed {MAX_TTL_SECONDS} seconds"),
            });
        }

        Ok(StrategyConfig {
            api_key,
            callback_url,
            contact_field,
            prompt_message,
            ttl_seconds,
        })
    }
}

// Relative callbacks are kept as given and resolved by the mail client
fn check_callback_url(callback_url: &str) -> Result<(), ConfigError> {
    match url::Url::parse(callback_url) {
        Ok(_) => Ok(()),
        Err(url::ParseError::RelativeUrlWithoutBase) if callback_url.starts_with('/') => Ok(()),
        Err(e) => Err(ConfigError::InvalidValue {
            key: "callback_url",
            message: e.to_string(),
        }),
    }
}

fn required(value: Option<String>, what: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingRequired(what)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> StrategyConfigBuilder {
        StrategyConfig::builder()
            .api_key("secret")
            .callback_url("https://x.com/cb")
            .contact_field("email")
            .prompt_message("Log in?")
    }

    #[test]
    fn test_defaults() {
        let config = complete().build().unwrap();
        assert_eq!(config.ttl_seconds(), DEFAULT_TTL_SECONDS);
        assert_eq!(config.token_field(), "token");
        assert_eq!(config.contact_field(), "email");
    }

    #[test]
    fn test_missing_options_are_reported_in_order() {
        assert_eq!(
            StrategyConfig::builder().build(),
            Err(ConfigError::MissingRequired("an ApproveAPI key"))
        );
        assert_eq!(
            complete().callback_url("  ").build(),
            Err(ConfigError::MissingRequired("a callback URL"))
        );
        assert_eq!(
            complete().contact_field("").build(),
            Err(ConfigError::MissingRequired("a contact field"))
        );
        assert_eq!(
            complete().prompt_message("").build(),
            Err(ConfigError::MissingRequired("a login prompt message"))
        );
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            complete().callback_url("not a url").build(),
            Err(ConfigError::InvalidValue { key: "callback_url", .. })
        ));
        assert!(matches!(
            complete().callback_url("http://").build(),
            Err(ConfigError::InvalidValue { key: "callback_url", .. })
        ));
        assert!(matches!(
            complete().ttl_seconds(0).build(),
            Err(ConfigError::InvalidValue { key: "ttl", .. })
        ));
    }

    #[test]
    fn test_ttl_upper_bound() {
        assert_eq!(
            complete().ttl_seconds(MAX_TTL_SECONDS).build().unwrap().ttl_seconds(),
            MAX_TTL_SECONDS
        );
        for ttl in [MAX_TTL_SECONDS + 1, u64::MAX] {
            assert!(matches!(
                complete().ttl_seconds(ttl).build(),
                Err(ConfigError::InvalidValue { key: "ttl", .. })
            ));
        }
    }

    #[test]
    fn test_relative_callback_is_accepted() {
        let config = complete().callback_url("/auth/magic/callback").build().unwrap();
        assert_eq!(config.callback_url(), "/auth/magic/callback");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = complete().api_key("super-secret-key").build().unwrap();
        assert!(!format!("{config:?}").contains("super-secret-key"));
    }
}
