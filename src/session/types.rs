// Session types and data structures

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;
use tokio::time::Instant;

/// Longest accepted idle lifetime: one (leap) year
pub const MAX_TTL_SECS: i64 = 366 * 24 * 60 * 60;

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Idle lifetime: a session is live while `now - last_activity <= ttl`
    pub ttl_secs: i64,
    /// Interval of the background sweep in seconds (0 disables it)
    pub sweep_interval_secs: u64,
    /// Number of independently locked store shards
    pub shard_count: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 30 * 60, // 30 minutes
            sweep_interval_secs: 300,
            shard_count: 16,
        }
    }
}

impl SessionConfig {
    /// Idle lifetime, clamped to `0..=MAX_TTL_SECS`
    pub fn ttl(&self) -> Duration {
        Duration::seconds(self.ttl_secs.clamp(0, MAX_TTL_SECS))
    }
}

/// The single active session bound to an identity
#[derive(Clone)]
pub struct Session {
    pub identity: String,
    /// Client instance currently holding the session
    pub profile: String,
    /// Current session credential, rotated on every authenticate
    pub token: String,
    /// Network origin of the authenticating request (audit only)
    pub origin: String,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    /// Monotonic twin of `last_activity_at`; liveness is measured from here
    pub last_seen: Instant,
}

// Hand-written so the token never ends up in logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity)
            .field("profile", &self.profile)
            .field("token", &"<redacted>")
            .field("origin", &self.origin)
            .field("created_at", &self.created_at)
            .field("last_activity_at", &self.last_activity_at)
            .field("last_seen", &self.last_seen)
            .finish()
    }
}

impl Session {
    pub fn new(
        identity: String,
        profile: String,
        token: String,
        origin: String,
        now: DateTime<Utc>,
        seen: Instant,
    ) -> Self {
        Self {
            identity,
            profile,
            token,
            origin,
            created_at: now,
            last_activity_at: now,
            last_seen: seen,
        }
    }

    /// Live iff the monotonic idle time is at most `ttl`
    pub fn is_live(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.last_seen) <= ttl.to_std().unwrap_or_default()
    }

    /// Time left before the session stops being live, within `0..=ttl`
    pub fn remaining(&self, now: Instant, ttl: Duration) -> Duration {
        let idle = now.saturating_duration_since(self.last_seen);
        let idle = Duration::from_std(idle).unwrap_or(ttl);
        (ttl - idle).max(Duration::zero())
    }

    pub fn touch(&mut self, now: DateTime<Utc>, seen: Instant) {
        self.last_activity_at = now;
        self.last_seen = seen;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            profile: self.profile.clone(),
            origin: self.origin.clone(),
            last_activity_at: self.last_activity_at,
        }
    }

    /// Administrative view: masked identity, no token
    pub fn to_summary(&self, now: Instant, ttl: Duration) -> SessionSummary {
        SessionSummary {
            identity: mask_identity(&self.identity),
            profile: self.profile.clone(),
            origin: self.origin.clone(),
            last_activity_at: self.last_activity_at,
            remaining_ttl_ms: self.remaining(now, ttl).num_milliseconds(),
        }
    }
}

/// What a takeover displaced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub profile: String,
    pub origin: String,
    pub last_activity_at: DateTime<Utc>,
}

/// How a successful authenticate relates to what was there before
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginKind {
    /// No live session existed
    New,
    /// Same profile signed in again
    Reconnect,
    /// A different profile replaced a live session
    Takeover,
}

/// Result of a successful authenticate
#[derive(Debug, Clone)]
pub struct AuthGrant {
    pub token: String,
    pub profile: String,
    pub ttl: Duration,
    pub kind: LoginKind,
    /// Present only on takeover
    pub previous: Option<SessionSnapshot>,
}

impl AuthGrant {
    pub fn replaced_previous(&self) -> bool {
        self.kind == LoginKind::Takeover
    }
}

/// Why a session check did not pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Rejection {
    /// No live session for the identity
    Expired,
    /// The presented token belongs to a session that has been replaced
    Superseded,
    /// Token matched but the profile did not
    ProfileMismatch,
}

impl Rejection {
    pub fn message(&self) -> &'static str {
        match self {
            Rejection::Expired => "No active session",
            Rejection::Superseded => "Session was taken over by another sign-in",
            Rejection::ProfileMismatch => "Session belongs to a different profile",
        }
    }
}

/// Outcome of validate and renew
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCheck {
    Live { expires_in: Duration },
    Rejected(Rejection),
}

impl SessionCheck {
    pub fn is_live(&self) -> bool {
        matches!(self, SessionCheck::Live { .. })
    }
}

/// Outcome of terminate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminateOutcome {
    /// The session was removed
    Terminated,
    /// Nothing to remove; the desired end state already holds
    NoSession,
    /// The presented token is stale; the current session was left alone
    AlreadySuperseded,
    /// Profile-only logout from a profile that no longer holds the session
    DifferentProfile,
}

impl TerminateOutcome {
    pub fn is_ok(&self) -> bool {
        !matches!(self, TerminateOutcome::DifferentProfile)
    }

    pub fn message(&self) -> &'static str {
        match self {
            TerminateOutcome::Terminated => "Signed out",
            TerminateOutcome::NoSession => "No active session",
            TerminateOutcome::AlreadySuperseded => "Session was already taken over",
            TerminateOutcome::DifferentProfile => "A different profile holds the session",
        }
    }
}

/// Administrative listing entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub identity: String,
    pub profile: String,
    pub origin: String,
    pub last_activity_at: DateTime<Utc>,
    pub remaining_ttl_ms: i64,
}

/// Partially hide an identity for display.
///
/// `alice@example.com` becomes `al***@example.com`; identities without `@`
/// keep their first two characters; anything of two characters or fewer is
/// fully masked.
pub fn mask_identity(identity: &str) -> String {
    let (local, domain) = match identity.split_once('@') {
        Some((local, domain)) => (local, Some(domain)),
        None => (identity, None),
    };

    let masked_local = if local.chars().count() <= 2 {
        "***".to_string()
    } else {
        let head: String = local.chars().take(2).collect();
        format!("{}***", head)
    };

    match domain {
        Some(domain) => format!("{}@{}", masked_local, domain),
        None => masked_local,
    }
}
