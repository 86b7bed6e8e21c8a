// Fixed in-memory credential table

use super::{CredentialError, CredentialStore, secret_matches};
use async_trait::async_trait;
use std::collections::HashMap;

/// Credential store over a fixed identity -> secret map
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialStore {
    users: HashMap<String, String>,
}

impl StaticCredentialStore {
    /// Builder-style insert, handy for tests and fixtures
    pub fn with_user(mut self, identity: impl Into<String>, secret: impl Into<String>) -> Self {
        self.users.insert(identity.into(), secret.into());
        self
    }
}

#[async_trait]
impl CredentialStore for StaticCredentialStore {
    async fn verify(&self, identity: &str, secret: &str) -> Result<bool, CredentialError> {
        Ok(secret_matches(
            self.users.get(identity).map(String::as_str),
            secret,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_store_verifies() {
        let store = StaticCredentialStore::default().with_user("a@x", "1234");

        assert!(store.verify("a@x", "1234").await.unwrap());
        assert!(!store.verify("a@x", "wrong").await.unwrap());
        assert!(!store.verify("nobody@x", "1234").await.unwrap());
    }
}
