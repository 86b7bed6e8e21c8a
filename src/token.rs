// Session token generation

use rand::RngCore;
use rand::rngs::OsRng;

/// Prefix carried by every issued session token
pub const TOKEN_PREFIX: &str = "sess_";

/// Random bytes per token before hex encoding (16 bytes = 32 hex chars)
const TOKEN_BYTES: usize = 16;

/// Produces unguessable session credentials.
pub trait TokenGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Token generator backed by the operating system CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandomTokens;

impl TokenGenerator for OsRandomTokens {
    fn generate(&self) -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        format!("{}{}", TOKEN_PREFIX, hex::encode(bytes))
    }
}
