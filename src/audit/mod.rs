// Audit trail for session lifecycle events
// Login, reconnect, takeover, renew, logout, expiry and failed attempts

pub mod logger;
pub mod sink;
pub mod types;

pub use logger::AuditLogger;
pub use sink::{AuditSink, MemoryAuditSink, TracingAuditSink};
pub use types::{AuditAction, AuditEntry};
