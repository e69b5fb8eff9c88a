//! Testing utilities for the magic link flow
//!
//! - [`fixtures`] - Pre-built configuration, identities and strategies
//! - [`mock`] - Recording doubles for the prompt provider and verify-user hook
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use magiclink::testing::{fixtures::TestFixtures, mock::{MockPromptClient, MockVerifyUser}};
//!
//! let client = Arc::new(MockPromptClient::new());
//! let users = Arc::new(MockVerifyUser::returning(TestFixtures::identity()));
//! let strategy = TestFixtures::strategy(client.clone(), users.clone());
//! ```

pub mod fixtures;
pub mod mock;

pub use fixtures::TestFixtures;
pub use mock::{MockPromptClient, MockVerifyUser};

/// Common test constants
pub mod constants {
    /// Signing secret / API key used by test strategies
    pub const TEST_SECRET: &str = "test_key_32_bytes_long_for_test_";

    /// Callback the magic link points at
    pub const TEST_CALLBACK_URL: &str = "https://app.example.com/auth/magic/callback";

    /// Default contact field
    pub const TEST_CONTACT_FIELD: &str = "email";

    /// Default test email address
    pub const TEST_EMAIL: &str = "test@example.com";

    /// Prompt body sent to the provider
    pub const TEST_PROMPT_MESSAGE: &str = "Would you like to log in to Example?";
}
