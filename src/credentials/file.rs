// JSON file credential store
// The file is a flat object: { "alice@example.com": "secret", ... }

use super::{CredentialError, CredentialStore, secret_matches};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Credential store that re-reads a JSON file on every lookup, so edits to
/// the file take effect without a restart.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<HashMap<String, String>, CredentialError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            error!(
                "Failed to read credentials file '{}': {}",
                self.path.display(),
                e
            );
            CredentialError::Unavailable(format!("{}: {}", self.path.display(), e))
        })?;

        let users: HashMap<String, String> = serde_json::from_str(&raw).map_err(|e| {
            error!(
                "Failed to parse credentials file '{}': {}",
                self.path.display(),
                e
            );
            CredentialError::Malformed(format!("{}: {}", self.path.display(), e))
        })?;

        debug!(
            "Loaded {} credential(s) from {}",
            users.len(),
            self.path.display()
        );
        Ok(users)
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn verify(&self, identity: &str, secret: &str) -> Result<bool, CredentialError> {
        let users = self.load().await?;
        Ok(secret_matches(users.get(identity).map(String::as_str), secret))
    }
}
