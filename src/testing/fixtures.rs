//! Pre-built test data

use serde_json::{json, Value};
use std::sync::Arc;

use super::constants::{
    TEST_CALLBACK_URL, TEST_CONTACT_FIELD, TEST_EMAIL, TEST_PROMPT_MESSAGE, TEST_SECRET,
};
use super::mock::{MockPromptClient, MockVerifyUser};
use crate::strategy::{MagicLinkStrategy, StrategyConfig, StrategyConfigBuilder};

pub struct TestFixtures;

impl TestFixtures {
    /// Builder with every required option filled in
    #[must_use]
    pub fn config_builder() -> StrategyConfigBuilder {
        StrategyConfig::builder()
            .api_key(TEST_SECRET)
            .callback_url(TEST_CALLBACK_URL)
            .contact_field(TEST_CONTACT_FIELD)
            .prompt_message(TEST_PROMPT_MESSAGE)
    }

    /// Valid configuration with the default TTL
    ///
    /// # Panics
    ///
    /// Never in practice; the fixture values are valid.
    #[must_use]
    pub fn strategy_config() -> StrategyConfig {
        Self::config_builder()
            .build()
            .expect("fixture configuration is valid")
    }

    /// Identity payload as an application would return it
    #[must_use]
    pub fn identity() -> Value {
        json!({"id": 1, "email": TEST_EMAIL, "name": "Test User"})
    }

    /// Strategy wired to the given doubles
    #[must_use]
    pub fn strategy(
        client: Arc<MockPromptClient>,
        verify_user: Arc<MockVerifyUser>,
    ) -> MagicLinkStrategy {
        MagicLinkStrategy::new(Self::strategy_config(), client, verify_user)
    }
}
