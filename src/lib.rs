#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Stateless magic link authentication
//!
//! A user asks for a login link, a signed and expiring token is minted for
//! them and delivered through an ApproveAPI prompt, and following the link
//! presents the token back for verification.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use magiclink::{AuthOptions, AuthOutcome, AuthRequest, MagicLinkStrategy, StrategyConfig};
//!
//! let config = StrategyConfig::builder()
//!     .api_key("approveapi-key")
//!     .callback_url("https://app.example.com/auth/magic/callback")
//!     .contact_field("email")
//!     .prompt_message("Would you like to log in?")
//!     .build()?;
//!
//! let strategy = MagicLinkStrategy::new(config, prompt_client, verify_user);
//! match strategy.authenticate(&request, &AuthOptions::default()).await {
//!     AuthOutcome::Success(user) => { /* logged in */ }
//!     other => { /* fail, pass or error */ }
//! }
//! ```

/// Version of the magiclink crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod delivery;
pub mod error;
pub mod handlers;
pub mod lookup;
pub mod settings;
pub mod strategy;
pub mod token;
pub mod user_store;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use delivery::{ApproveClient, PromptClient, PromptRequest, TokenDelivery};
pub use error::{ConfigError, DeliveryError, MagicLinkError, TokenError};
pub use settings::MagicLinkSettings;
pub use strategy::{
    Action, AuthOptions, AuthOutcome, AuthRequest, MagicLinkStrategy, StrategyConfig, VerifyFn,
    VerifyUser,
};
pub use token::TokenCodec;
pub use user_store::UserDirectory;
