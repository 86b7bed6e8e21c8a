use axum::{Json, extract::State, http::HeaderMap};
use serde::Serialize;

use crate::app::{ADMIN_KEY_HEADER, AppState};
use crate::error::SessionError;
use crate::session::SessionSummary;

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub ok: bool,
    pub count: usize,
    pub sessions: Vec<SessionSummary>,
}

/// GET /admin/sessions
///
/// Only callers presenting the configured admin key get the listing.
pub async fn list_sessions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionListResponse>, SessionError> {
    let admin_key = headers
        .get(ADMIN_KEY_HEADER)
        .and_then(|h| h.to_str().ok());

    let sessions = state.registry.enumerate(admin_key).await?;

    Ok(Json(SessionListResponse {
        ok: true,
        count: sessions.len(),
        sessions,
    }))
}
