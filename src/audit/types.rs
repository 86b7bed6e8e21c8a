// Audit entry types

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Session lifecycle actions worth recording
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// First session for the identity (or the previous one had expired)
    Login,
    /// Same profile authenticated again; token rotated
    Reconnect,
    /// A different profile replaced a live session
    Takeover,
    /// Wrong identity or secret
    LoginFailed,
    /// Heartbeat extended the session
    Renewed,
    /// Session removed on request
    Logout,
    /// Session removed by the expiry sweep
    Expired,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "login",
            AuditAction::Reconnect => "reconnect",
            AuditAction::Takeover => "takeover",
            AuditAction::LoginFailed => "login_failed",
            AuditAction::Renewed => "renewed",
            AuditAction::Logout => "logout",
            AuditAction::Expired => "expired",
        }
    }

    /// Whether the event deserves a warning-level line
    pub fn is_security_relevant(&self) -> bool {
        matches!(self, AuditAction::Takeover | AuditAction::LoginFailed)
    }
}

/// One audit record
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub identity: String,
    pub profile: Option<String>,
    /// Profile that was displaced by a takeover
    pub previous_profile: Option<String>,
    pub origin: Option<String>,
}

impl AuditEntry {
    pub fn builder(action: AuditAction, identity: impl Into<String>) -> AuditEntryBuilder {
        AuditEntryBuilder {
            entry: AuditEntry {
                timestamp: Utc::now(),
                action,
                identity: identity.into(),
                profile: None,
                previous_profile: None,
                origin: None,
            },
        }
    }
}

pub struct AuditEntryBuilder {
    entry: AuditEntry,
}

impl AuditEntryBuilder {
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.entry.timestamp = timestamp;
        self
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.entry.profile = Some(profile.into());
        self
    }

    pub fn previous_profile(mut self, profile: impl Into<String>) -> Self {
        self.entry.previous_profile = Some(profile.into());
        self
    }

    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.entry.origin = Some(origin.into());
        self
    }

    pub fn build(self) -> AuditEntry {
        self.entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let at = Utc::now();
        let entry = AuditEntry::builder(AuditAction::Takeover, "a@x")
            .timestamp(at)
            .profile("P2")
            .previous_profile("P1")
            .origin("10.0.0.1")
            .build();

        assert_eq!(entry.timestamp, at);
        assert_eq!(entry.identity, "a@x");
        assert_eq!(entry.profile.as_deref(), Some("P2"));
        assert_eq!(entry.previous_profile.as_deref(), Some("P1"));
        assert_eq!(entry.origin.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn test_action_serialization() {
        let json = serde_json::to_string(&AuditAction::LoginFailed).unwrap();
        assert_eq!(json, "\"login_failed\"");
        assert_eq!(AuditAction::LoginFailed.as_str(), "login_failed");
    }

    #[test]
    fn test_security_relevance() {
        assert!(AuditAction::Takeover.is_security_relevant());
        assert!(AuditAction::LoginFailed.is_security_relevant());
        assert!(!AuditAction::Login.is_security_relevant());
        assert!(!AuditAction::Logout.is_security_relevant());
    }
}
