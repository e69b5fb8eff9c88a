//! Mock collaborators for isolated strategy tests
//!
//! Both doubles record what they were called with so tests can assert on the
//! exact provider request or verify-user fields.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Mutex;

use crate::delivery::{Prompt, PromptClient, PromptRequest};
use crate::error::DeliveryError;
use crate::strategy::VerifyUser;

enum PromptBehavior {
    Accept,
    Reject { status: u16, body: String },
    Unreachable,
}

/// Prompt provider double
pub struct MockPromptClient {
    behavior: PromptBehavior,
    requests: Mutex<Vec<PromptRequest>>,
}

impl Default for MockPromptClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPromptClient {
    /// Accepts every prompt
    #[must_use]
    pub fn new() -> Self {
        Self::with_behavior(PromptBehavior::Accept)
    }

    /// Answers every prompt with the given HTTP status
    #[must_use]
    pub fn rejecting(status: u16, body: &str) -> Self {
        Self::with_behavior(PromptBehavior::Reject {
            status,
            body: body.to_string(),
        })
    }

    /// Fails every prompt as if the network was down
    #[must_use]
    pub fn unreachable() -> Self {
        Self::with_behavior(PromptBehavior::Unreachable)
    }

    fn with_behavior(behavior: PromptBehavior) -> Self {
        Self {
            behavior,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request received so far, in order
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn requests(&self) -> Vec<PromptRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PromptClient for MockPromptClient {
    async fn create_prompt(&self, request: &PromptRequest) -> Result<Prompt, DeliveryError> {
        let count = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };

        match &self.behavior {
            PromptBehavior::Accept => Ok(Prompt {
                id: format!("prompt_{count}"),
                ..Prompt::default()
            }),
            PromptBehavior::Reject { status, body } => Err(DeliveryError::Rejected {
                status: *status,
                body: body.clone(),
            }),
            PromptBehavior::Unreachable => {
                Err(DeliveryError::Transport("connection refused".to_string()))
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

enum VerifyBehavior {
    Found(Value),
    NotFound,
    Fails(String),
}

/// Verify-user double
pub struct MockVerifyUser {
    behavior: VerifyBehavior,
    calls: Mutex<Vec<Value>>,
}

impl MockVerifyUser {
    /// Resolves every lookup to `user`
    #[must_use]
    pub fn returning(user: Value) -> Self {
        Self::with_behavior(VerifyBehavior::Found(user))
    }

    /// Finds nobody
    #[must_use]
    pub fn empty() -> Self {
        Self::with_behavior(VerifyBehavior::NotFound)
    }

    /// Fails every lookup with `message`
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self::with_behavior(VerifyBehavior::Fails(message.to_string()))
    }

    fn with_behavior(behavior: VerifyBehavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fields of every call so far, in order
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<Value> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VerifyUser for MockVerifyUser {
    async fn verify_user(&self, fields: &Map<String, Value>) -> anyhow::Result<Option<Value>> {
        self.calls
            .lock()
            .unwrap()
            .push(Value::Object(fields.clone()));

        match &self.behavior {
            VerifyBehavior::Found(user) => Ok(Some(user.clone())),
            VerifyBehavior::NotFound => Ok(None),
            VerifyBehavior::Fails(message) => Err(anyhow::anyhow!(message.clone())),
        }
    }
}
