// Audit logger: typed helpers over an AuditSink

use super::sink::AuditSink;
use super::types::{AuditAction, AuditEntry};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Records session lifecycle events through the configured sink
#[derive(Clone)]
pub struct AuditLogger {
    sink: Arc<dyn AuditSink>,
}

impl AuditLogger {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    pub async fn log(&self, entry: AuditEntry) {
        self.sink.record(entry).await;
    }

    pub async fn log_login(
        &self,
        action: AuditAction,
        identity: &str,
        profile: &str,
        origin: &str,
        at: DateTime<Utc>,
    ) {
        let entry = AuditEntry::builder(action, identity)
            .timestamp(at)
            .profile(profile)
            .origin(origin)
            .build();
        self.log(entry).await;
    }

    pub async fn log_takeover(
        &self,
        identity: &str,
        previous_profile: &str,
        profile: &str,
        origin: &str,
        at: DateTime<Utc>,
    ) {
        let entry = AuditEntry::builder(AuditAction::Takeover, identity)
            .timestamp(at)
            .profile(profile)
            .previous_profile(previous_profile)
            .origin(origin)
            .build();
        self.log(entry).await;
    }

    pub async fn log_login_failed(&self, identity: &str, origin: &str, at: DateTime<Utc>) {
        let entry = AuditEntry::builder(AuditAction::LoginFailed, identity)
            .timestamp(at)
            .origin(origin)
            .build();
        self.log(entry).await;
    }

    /// Renew, logout and expiry events
    pub async fn log_session_event(
        &self,
        action: AuditAction,
        identity: &str,
        profile: &str,
        at: DateTime<Utc>,
    ) {
        let entry = AuditEntry::builder(action, identity)
            .timestamp(at)
            .profile(profile)
            .build();
        self.log(entry).await;
    }
}
