// Session management module
// One live session per identity, lazy expiry, token-based takeover detection

pub mod registry;
pub mod storage;
pub mod types;

pub use registry::SessionRegistry;
pub use storage::MemorySessionStorage;
pub use types::{
    AuthGrant, LoginKind, MAX_TTL_SECS, Rejection, Session, SessionCheck, SessionConfig,
    SessionSnapshot, SessionSummary, TerminateOutcome, mask_identity,
};
