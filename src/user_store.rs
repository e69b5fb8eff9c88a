//! Static user directory backing the bundled server
//!
//! Users come from the `[[users]]` tables of the settings file. The directory
//! answers verify-user lookups by comparing the requested contact value with
//! each user's contact field (case-insensitive for strings).

use async_trait::async_trait;
use log::debug;
use serde_json::{Map, Value};

use crate::lookup::lookup;
use crate::strategy::VerifyUser;

#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    contact_field: String,
    users: Vec<Value>,
}

impl UserDirectory {
    #[must_use]
    pub fn new(contact_field: impl Into<String>, users: Vec<Value>) -> Self {
        Self {
            contact_field: contact_field.into(),
            users,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// First user whose contact field matches `contact`
    #[must_use]
    pub fn find(&self, contact: &Value) -> Option<&Value> {
        self.users.iter().find(|user| {
            lookup(user, &self.contact_field)
                .is_some_and(|candidate| same_contact(candidate, contact))
        })
    }
}

fn same_contact(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(a), Value::String(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
        _ => a == b,
    }
}

#[async_trait]
impl VerifyUser for UserDirectory {
    async fn verify_user(&self, fields: &Map<String, Value>) -> anyhow::Result<Option<Value>> {
        let Some(contact) = fields.get(&self.contact_field) else {
            anyhow::bail!("contact field '{}' missing from lookup", self.contact_field);
        };

        let user = self.find(contact).cloned();
        debug!(
            "User directory lookup on '{}': {}",
            self.contact_field,
            if user.is_some() { "found" } else { "not found" }
        );
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn directory() -> UserDirectory {
        UserDirectory::new(
            "email",
            vec![
                json!({"id": 1, "email": "Alice@Example.com"}),
                json!({"id": 2, "email": "bob@example.com"}),
                json!({"id": 3}),
            ],
        )
    }

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let mut fields = Map::new();
        fields.insert("email".to_string(), json!("alice@example.com"));

        let user = directory().verify_user(&fields).await.unwrap();
        assert_eq!(user, Some(json!({"id": 1, "email": "Alice@Example.com"})));
    }

    #[tokio::test]
    async fn test_unknown_contact_is_none() {
        let mut fields = Map::new();
        fields.insert("email".to_string(), json!("carol@example.com"));

        assert_eq!(directory().verify_user(&fields).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_field_is_an_error() {
        assert!(directory().verify_user(&Map::new()).await.is_err());
    }

    #[test]
    fn test_nested_contact_field() {
        let directory = UserDirectory::new(
            "contact.phone",
            vec![json!({"id": 7, "contact": {"phone": "+15551234567"}})],
        );
        assert_eq!(directory.find(&json!("+15551234567")).unwrap()["id"], 7);
        assert_eq!(directory.len(), 1);
    }
}
