// Application state and router

use crate::handlers;
use crate::models::ServerConfig;
use crate::session::SessionRegistry;
use axum::{
    Router,
    http::{HeaderName, Method, header::CONTENT_TYPE},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Header carrying the privileged key for the admin view
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }
}

/// Build the HTTP router with CORS, body limit and request tracing
pub fn router(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(handlers::health::root))
        .route("/healthz", get(handlers::health::health_check))
        .route(
            "/auth",
            get(handlers::session::authenticate).post(handlers::session::authenticate),
        )
        .route("/check", get(handlers::session::check))
        .route("/touch", post(handlers::session::touch))
        .route(
            "/logout",
            get(handlers::session::logout).post(handlers::session::logout),
        )
        .route("/admin/sessions", get(handlers::admin::list_sessions))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(server.body_limit_bytes))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(ADMIN_KEY_HEADER)])
}
