// Application hook resolving request fields to a user
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Looks a user up from the contact fields of a token request
///
/// `Ok(None)` means nobody matched and becomes a `Fail` outcome. An `Err`
/// is treated as an unexpected failure and becomes an `Error` outcome.
#[async_trait]
pub trait VerifyUser: Send + Sync {
    /// # Errors
    ///
    /// Any failure of the underlying user lookup.
    async fn verify_user(&self, fields: &Map<String, Value>) -> anyhow::Result<Option<Value>>;
}

/// Wraps a synchronous closure as a [`VerifyUser`]
pub struct VerifyFn<F>(pub F);

#[async_trait]
impl<F> VerifyUser for VerifyFn<F>
where
    F: Fn(&Map<String, Value>) -> anyhow::Result<Option<Value>> + Send + Sync,
{
    async fn verify_user(&self, fields: &Map<String, Value>) -> anyhow::Result<Option<Value>> {
        (self.0)(fields)
    }
}
