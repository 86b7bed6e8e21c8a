// Session registry: the single authority over which profile holds each identity

use super::storage::MemorySessionStorage;
use super::types::{
    AuthGrant, LoginKind, Rejection, Session, SessionCheck, SessionConfig, SessionSummary,
    TerminateOutcome, mask_identity,
};
use crate::audit::{AuditAction, AuditLogger, AuditSink, TracingAuditSink};
use crate::clock::{Clock, SystemClock};
use crate::credentials::CredentialStore;
use crate::error::SessionError;
use crate::token::{OsRandomTokens, TokenGenerator};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Origin recorded when the transport could not tell us one
const UNKNOWN_ORIGIN: &str = "unknown";

/// Holds at most one session per identity and implements authenticate,
/// validate, renew, terminate and enumerate on top of it.
///
/// Expired sessions are removed lazily by whichever operation touches the
/// identity next, so no read ever observes a session past its TTL.
pub struct SessionRegistry {
    storage: MemorySessionStorage,
    credentials: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
    tokens: Arc<dyn TokenGenerator>,
    audit: AuditLogger,
    admin_key: Option<String>,
    config: SessionConfig,
}

impl SessionRegistry {
    /// Create an empty registry using the system clock, OS-random tokens and
    /// the tracing audit sink
    pub fn new(config: SessionConfig, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            storage: MemorySessionStorage::new(config.shard_count),
            credentials,
            clock: Arc::new(SystemClock),
            tokens: Arc::new(OsRandomTokens),
            audit: AuditLogger::new(Arc::new(TracingAuditSink)),
            admin_key: None,
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_token_generator(mut self, tokens: Arc<dyn TokenGenerator>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = AuditLogger::new(sink);
        self
    }

    /// Key required by [`SessionRegistry::enumerate`]. Without one the
    /// administrative view is disabled.
    pub fn with_admin_key(mut self, admin_key: Option<String>) -> Self {
        self.admin_key = admin_key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn ttl(&self) -> Duration {
        self.config.ttl()
    }

    /// Number of stored sessions, including expired ones not yet swept
    pub async fn session_count(&self) -> usize {
        self.storage.len().await
    }

    /// Verify credentials and bind `profile` to the identity.
    ///
    /// Any live session for the identity is replaced and its token stops
    /// validating, even when the profile is unchanged. A credential mismatch
    /// never touches stored state.
    pub async fn authenticate(
        &self,
        identity: &str,
        secret: &str,
        profile: &str,
        origin: &str,
    ) -> Result<AuthGrant, SessionError> {
        let identity = identity.trim();
        let secret = secret.trim();
        let profile = profile.trim();
        if identity.is_empty() || secret.is_empty() || profile.is_empty() {
            return Err(SessionError::missing_fields(&["identity", "secret", "profile"]));
        }
        let origin = normalize_origin(origin);

        // No slot lock is held while the credential backend runs.
        if !self.credentials.verify(identity, secret).await? {
            self.audit
                .log_login_failed(identity, &origin, self.clock.now())
                .await;
            return Err(SessionError::InvalidCredentials);
        }

        let ttl = self.ttl();
        let token = self.tokens.generate();
        let fresh_token = token.clone();

        let (now, expired, previous) = self
            .storage
            .update(identity, |slot| {
                let (now, seen) = (self.clock.now(), self.clock.instant());
                let expired = take_expired(slot, seen, ttl);
                let previous = slot.replace(Session::new(
                    identity.to_string(),
                    profile.to_string(),
                    fresh_token,
                    origin.clone(),
                    now,
                    seen,
                ));
                (now, expired, previous)
            })
            .await;

        self.log_expired(expired, now).await;

        let kind = match &previous {
            None => LoginKind::New,
            Some(prev) if prev.profile == profile => LoginKind::Reconnect,
            Some(_) => LoginKind::Takeover,
        };

        match (&kind, &previous) {
            (LoginKind::Takeover, Some(prev)) => {
                info!(
                    "Takeover for {}: profile {} replaced by {}",
                    mask_identity(identity),
                    prev.profile,
                    profile
                );
                self.audit
                    .log_takeover(identity, &prev.profile, profile, &origin, now)
                    .await;
            }
            (LoginKind::Reconnect, _) => {
                debug!(
                    "Reconnect for {} on profile {}",
                    mask_identity(identity),
                    profile
                );
                self.audit
                    .log_login(AuditAction::Reconnect, identity, profile, &origin, now)
                    .await;
            }
            _ => {
                info!(
                    "New session for {} on profile {}",
                    mask_identity(identity),
                    profile
                );
                self.audit
                    .log_login(AuditAction::Login, identity, profile, &origin, now)
                    .await;
            }
        }

        Ok(AuthGrant {
            token,
            profile: profile.to_string(),
            ttl,
            kind,
            previous: previous
                .filter(|_| kind == LoginKind::Takeover)
                .map(|prev| prev.snapshot()),
        })
    }

    /// Check whether the caller still holds the identity's current session.
    ///
    /// The token decides ownership; the profile is only compared once the
    /// token matches. Nothing is mutated apart from sweeping an expired session.
    pub async fn validate(
        &self,
        identity: &str,
        profile: &str,
        token: &str,
    ) -> Result<SessionCheck, SessionError> {
        let (identity, profile, token) = owner_fields(identity, profile, token)?;
        let ttl = self.ttl();

        let (now, expired, check) = self
            .storage
            .update(identity, |slot| {
                let (now, seen) = (self.clock.now(), self.clock.instant());
                let expired = take_expired(slot, seen, ttl);
                let check = match slot.as_ref() {
                    None => SessionCheck::Rejected(Rejection::Expired),
                    Some(session) => check_owner(session, profile, token, seen, ttl),
                };
                (now, expired, check)
            })
            .await;

        self.log_expired(expired, now).await;
        Ok(check)
    }

    /// Extend the caller's session. Same ownership rules as validate; only a
    /// full match touches `last_activity`.
    pub async fn renew(
        &self,
        identity: &str,
        profile: &str,
        token: &str,
    ) -> Result<SessionCheck, SessionError> {
        let (identity, profile, token) = owner_fields(identity, profile, token)?;
        let ttl = self.ttl();

        let (now, expired, check) = self
            .storage
            .update(identity, |slot| {
                let (now, seen) = (self.clock.now(), self.clock.instant());
                let expired = take_expired(slot, seen, ttl);
                let check = match slot.as_mut() {
                    None => SessionCheck::Rejected(Rejection::Expired),
                    Some(session) => match check_owner(session, profile, token, seen, ttl) {
                        SessionCheck::Live { .. } => {
                            session.touch(now, seen);
                            SessionCheck::Live { expires_in: ttl }
                        }
                        rejected => rejected,
                    },
                };
                (now, expired, check)
            })
            .await;

        self.log_expired(expired, now).await;

        match check {
            SessionCheck::Live { .. } => {
                self.audit
                    .log_session_event(AuditAction::Renewed, identity, profile, now)
                    .await;
            }
            SessionCheck::Rejected(reason) => {
                debug!(
                    "Renew rejected for {}: {:?}",
                    mask_identity(identity),
                    reason
                );
            }
        }

        Ok(check)
    }

    /// End the identity's session.
    ///
    /// A matching token removes it regardless of profile. A stale token leaves
    /// the current session alone. Without a token, a profile must match. With
    /// neither, the session is removed unconditionally. Terminating an absent
    /// session succeeds.
    pub async fn terminate(
        &self,
        identity: &str,
        profile: Option<&str>,
        token: Option<&str>,
    ) -> Result<TerminateOutcome, SessionError> {
        let identity = identity.trim();
        if identity.is_empty() {
            return Err(SessionError::missing_fields(&["identity"]));
        }
        let profile = profile.map(str::trim).filter(|p| !p.is_empty());
        let token = token.map(str::trim).filter(|t| !t.is_empty());
        let ttl = self.ttl();

        let (now, expired, outcome, removed) = self
            .storage
            .update(identity, |slot| {
                let now = self.clock.now();
                let expired = take_expired(slot, self.clock.instant(), ttl);

                let Some(current) = slot.as_ref() else {
                    return (now, expired, TerminateOutcome::NoSession, None);
                };

                let outcome = match (token, profile) {
                    (Some(token), _) if tokens_match(&current.token, token) => {
                        TerminateOutcome::Terminated
                    }
                    (Some(_), _) => TerminateOutcome::AlreadySuperseded,
                    (None, Some(profile)) if current.profile == profile => {
                        TerminateOutcome::Terminated
                    }
                    (None, Some(_)) => TerminateOutcome::DifferentProfile,
                    (None, None) => TerminateOutcome::Terminated,
                };

                let removed = match outcome {
                    TerminateOutcome::Terminated => slot.take(),
                    _ => None,
                };
                (now, expired, outcome, removed)
            })
            .await;

        self.log_expired(expired, now).await;

        if let Some(session) = removed {
            info!(
                "Session for {} on profile {} terminated",
                mask_identity(identity),
                session.profile
            );
            self.audit
                .log_session_event(AuditAction::Logout, identity, &session.profile, now)
                .await;
        } else {
            debug!(
                "Terminate for {} left state unchanged: {:?}",
                mask_identity(identity),
                outcome
            );
        }

        Ok(outcome)
    }

    /// Administrative snapshot of all live sessions, most recent first.
    /// Requires the configured admin key.
    pub async fn enumerate(
        &self,
        admin_key: Option<&str>,
    ) -> Result<Vec<SessionSummary>, SessionError> {
        self.authorize_admin(admin_key)?;
        self.sweep_expired().await;

        let seen = self.clock.instant();
        let ttl = self.ttl();
        let mut live: Vec<Session> = self
            .storage
            .all()
            .await
            .into_iter()
            .filter(|session| session.is_live(seen, ttl))
            .collect();
        live.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));

        Ok(live
            .iter()
            .map(|session| session.to_summary(seen, ttl))
            .collect())
    }

    /// Remove every expired session. Returns how many were removed.
    pub async fn sweep_expired(&self) -> usize {
        let (now, seen) = (self.clock.now(), self.clock.instant());
        let ttl = self.ttl();
        let removed = self
            .storage
            .remove_where(|session| !session.is_live(seen, ttl))
            .await;

        let count = removed.len();
        for session in removed {
            self.log_expired(Some(session), now).await;
        }
        count
    }

    /// Start the periodic sweep. Returns `None` when it is disabled.
    /// The task runs until aborted.
    pub fn spawn_sweeper(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self.config.sweep_interval_secs == 0 {
            return None;
        }

        let registry = Arc::clone(self);
        let period = std::time::Duration::from_secs(self.config.sweep_interval_secs);

        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately.
            interval.tick().await;

            loop {
                interval.tick().await;
                let removed = registry.sweep_expired().await;
                if removed > 0 {
                    debug!("Periodic sweep removed {} expired session(s)", removed);
                }
            }
        }))
    }

    fn authorize_admin(&self, presented: Option<&str>) -> Result<(), SessionError> {
        let presented = presented.map(str::trim).filter(|k| !k.is_empty());

        match (self.admin_key.as_deref(), presented) {
            (Some(expected), Some(presented)) if tokens_match(expected, presented) => Ok(()),
            (None, _) => {
                warn!("Admin request rejected: no admin key configured");
                Err(SessionError::Unauthorized)
            }
            _ => {
                warn!("Admin request rejected: missing or wrong admin key");
                Err(SessionError::Unauthorized)
            }
        }
    }

    async fn log_expired(&self, expired: Option<Session>, now: DateTime<Utc>) {
        if let Some(session) = expired {
            debug!(
                "Session for {} expired (last activity {})",
                mask_identity(&session.identity),
                session.last_activity_at
            );
            self.audit
                .log_session_event(AuditAction::Expired, &session.identity, &session.profile, now)
                .await;
        }
    }
}

/// Lazy expiry: empty the slot if its session is no longer live
fn take_expired(slot: &mut Option<Session>, now: Instant, ttl: Duration) -> Option<Session> {
    if slot.as_ref().is_some_and(|session| !session.is_live(now, ttl)) {
        slot.take()
    } else {
        None
    }
}

fn check_owner(
    session: &Session,
    profile: &str,
    token: &str,
    now: Instant,
    ttl: Duration,
) -> SessionCheck {
    if !tokens_match(&session.token, token) {
        SessionCheck::Rejected(Rejection::Superseded)
    } else if session.profile != profile {
        SessionCheck::Rejected(Rejection::ProfileMismatch)
    } else {
        SessionCheck::Live {
            expires_in: session.remaining(now, ttl),
        }
    }
}

fn tokens_match(expected: &str, presented: &str) -> bool {
    bool::from(expected.as_bytes().ct_eq(presented.as_bytes()))
}

fn owner_fields<'a>(
    identity: &'a str,
    profile: &'a str,
    token: &'a str,
) -> Result<(&'a str, &'a str, &'a str), SessionError> {
    let (identity, profile, token) = (identity.trim(), profile.trim(), token.trim());
    if identity.is_empty() || profile.is_empty() || token.is_empty() {
        return Err(SessionError::missing_fields(&["identity", "profile", "token"]));
    }
    Ok((identity, profile, token))
}

fn normalize_origin(origin: &str) -> String {
    let origin = origin.trim();
    if origin.is_empty() {
        UNKNOWN_ORIGIN.to_string()
    } else {
        origin.to_string()
    }
}
