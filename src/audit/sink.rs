// Audit sinks

use super::types::{AuditAction, AuditEntry};
use crate::session::mask_identity;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Destination for audit entries
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: AuditEntry);
}

/// Writes audit entries as structured tracing events on the `audit` target.
/// Identities are masked; tokens and secrets never reach this sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, entry: AuditEntry) {
        let identity = mask_identity(&entry.identity);
        let profile = entry.profile.as_deref().unwrap_or("-");
        let previous = entry.previous_profile.as_deref().unwrap_or("-");
        let origin = entry.origin.as_deref().unwrap_or("-");
        let at = entry.timestamp.to_rfc3339();

        if entry.action.is_security_relevant() {
            warn!(
                target: "audit",
                action = entry.action.as_str(),
                identity = %identity,
                profile,
                previous_profile = previous,
                origin,
                at = %at,
                "session audit"
            );
        } else if entry.action == AuditAction::Renewed {
            // Heartbeats are frequent; keep them out of the default log level.
            debug!(
                target: "audit",
                action = entry.action.as_str(),
                identity = %identity,
                profile,
                at = %at,
                "session audit"
            );
        } else {
            info!(
                target: "audit",
                action = entry.action.as_str(),
                identity = %identity,
                profile,
                origin,
                at = %at,
                "session audit"
            );
        }
    }
}

/// Keeps entries in memory. Suitable for tests.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: RwLock<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, entry: AuditEntry) {
        self.entries.write().await.push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_sink_keeps_order() {
        let sink = MemoryAuditSink::new();
        sink.record(AuditEntry::builder(AuditAction::Login, "a@x").build()).await;
        sink.record(AuditEntry::builder(AuditAction::Logout, "a@x").build()).await;

        let actions: Vec<AuditAction> = sink.entries().await.iter().map(|e| e.action).collect();
        assert_eq!(actions, vec![AuditAction::Login, AuditAction::Logout]);
    }

    #[tokio::test]
    async fn test_tracing_sink_accepts_entries() {
        TracingAuditSink
            .record(
                AuditEntry::builder(AuditAction::Takeover, "a@x")
                    .profile("P2")
                    .previous_profile("P1")
                    .build(),
            )
            .await;
    }
}
