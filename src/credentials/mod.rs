// Credential lookup capability
// The registry only asks "does this secret belong to this identity?"

pub mod file;
pub mod memory;

use async_trait::async_trait;
use subtle::ConstantTimeEq;
use thiserror::Error;

pub use file::FileCredentialStore;
pub use memory::StaticCredentialStore;

/// Failure of the credential backend itself (not a wrong secret)
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential store unavailable: {0}")]
    Unavailable(String),

    #[error("credential store is malformed: {0}")]
    Malformed(String),
}

/// Backend that verifies an identity/secret pair.
///
/// Implementations may be slow (file or network I/O). The registry calls
/// this before touching any session state.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn verify(&self, identity: &str, secret: &str) -> Result<bool, CredentialError>;
}

/// Compare a presented secret with the expected one without leaking timing.
/// A missing entry is compared against itself so both paths do the same work.
pub(crate) fn secret_matches(expected: Option<&str>, presented: &str) -> bool {
    match expected {
        Some(expected) => bool::from(expected.as_bytes().ct_eq(presented.as_bytes())),
        None => {
            let _ = presented.as_bytes().ct_eq(presented.as_bytes());
            false
        }
    }
}
