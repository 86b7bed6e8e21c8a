// Session endpoints: /auth, /check, /touch, /logout

use super::params::{RequestParams, client_origin};
use crate::app::AppState;
use crate::error::SessionError;
use crate::session::{
    AuthGrant, LoginKind, Rejection, SessionCheck, SessionSnapshot, TerminateOutcome,
};
use axum::{
    Json,
    extract::{ConnectInfo, State},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Authenticate input. Original wire names are accepted as aliases.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AuthParams {
    #[serde(alias = "email")]
    pub identity: String,
    #[serde(alias = "code")]
    pub secret: String,
    #[serde(alias = "profileId")]
    pub profile: String,
}

/// Input of /check and /touch
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OwnerParams {
    #[serde(alias = "email")]
    pub identity: String,
    #[serde(alias = "profileId")]
    pub profile: String,
    #[serde(alias = "sessionId")]
    pub token: String,
}

/// Input of /logout; profile and token are optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LogoutParams {
    #[serde(alias = "email")]
    pub identity: String,
    #[serde(alias = "profileId")]
    pub profile: Option<String>,
    #[serde(alias = "sessionId")]
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub ok: bool,
    pub msg: &'static str,
    pub token: String,
    /// Same value as `token`, under the name older clients read
    pub session_id: String,
    pub profile: String,
    pub ttl_ms: i64,
    pub takeover: bool,
    pub previous: Option<SessionSnapshot>,
}

impl From<AuthGrant> for AuthResponse {
    fn from(grant: AuthGrant) -> Self {
        let msg = match grant.kind {
            LoginKind::New => "Signed in",
            LoginKind::Reconnect => "Signed in again on the same profile",
            LoginKind::Takeover => "Signed out the previous profile and signed in",
        };

        Self {
            ok: true,
            msg,
            takeover: grant.replaced_previous(),
            ttl_ms: grant.ttl.num_milliseconds(),
            session_id: grant.token.clone(),
            token: grant.token,
            profile: grant.profile,
            previous: grant.previous,
        }
    }
}

/// Response of /check and /touch
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<Rejection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in_ms: Option<i64>,
}

impl From<SessionCheck> for CheckResponse {
    fn from(check: SessionCheck) -> Self {
        match check {
            SessionCheck::Live { expires_in } => Self {
                ok: true,
                reason: None,
                msg: None,
                expires_in_ms: Some(expires_in.num_milliseconds()),
            },
            SessionCheck::Rejected(reason) => Self {
                ok: false,
                reason: Some(reason),
                msg: Some(reason.message()),
                expires_in_ms: None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub ok: bool,
    pub msg: &'static str,
    pub outcome: TerminateOutcome,
}

impl From<TerminateOutcome> for LogoutResponse {
    fn from(outcome: TerminateOutcome) -> Self {
        Self {
            ok: outcome.is_ok(),
            msg: outcome.message(),
            outcome,
        }
    }
}

/// GET|POST /auth
pub async fn authenticate(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    RequestParams(params): RequestParams<AuthParams>,
) -> Result<Json<AuthResponse>, SessionError> {
    let origin = client_origin(&headers, peer.map(|ConnectInfo(addr)| addr));

    let grant = state
        .registry
        .authenticate(&params.identity, &params.secret, &params.profile, &origin)
        .await?;

    Ok(Json(grant.into()))
}

/// GET /check
pub async fn check(
    State(state): State<AppState>,
    RequestParams(params): RequestParams<OwnerParams>,
) -> Result<Json<CheckResponse>, SessionError> {
    let check = state
        .registry
        .validate(&params.identity, &params.profile, &params.token)
        .await?;

    Ok(Json(check.into()))
}

/// POST /touch
pub async fn touch(
    State(state): State<AppState>,
    RequestParams(params): RequestParams<OwnerParams>,
) -> Result<Json<CheckResponse>, SessionError> {
    let check = state
        .registry
        .renew(&params.identity, &params.profile, &params.token)
        .await?;

    Ok(Json(check.into()))
}

/// GET|POST /logout
pub async fn logout(
    State(state): State<AppState>,
    RequestParams(params): RequestParams<LogoutParams>,
) -> Result<Json<LogoutResponse>, SessionError> {
    let outcome = state
        .registry
        .terminate(
            &params.identity,
            params.profile.as_deref(),
            params.token.as_deref(),
        )
        .await?;

    Ok(Json(outcome.into()))
}
