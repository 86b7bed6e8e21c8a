use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use pmp_session_api::app::{ADMIN_KEY_HEADER, AppState, router};
use pmp_session_api::credentials::StaticCredentialStore;
use pmp_session_api::models::ServerConfig;
use pmp_session_api::session::{SessionConfig, SessionRegistry};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const ADMIN_KEY: &str = "http-admin-key-0123";

fn test_app() -> Router {
    let credentials = StaticCredentialStore::default().with_user("a@x", "1234");
    let registry = SessionRegistry::new(SessionConfig::default(), Arc::new(credentials))
        .with_admin_key(Some(ADMIN_KEY.to_string()));

    router(AppState::new(Arc::new(registry)), &ServerConfig::default())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_auth_check_touch_logout() {
    let app = test_app();

    let (status, body) = send(
        &app,
        post_json("/auth", json!({"identity": "a@x", "secret": "1234", "profile": "P1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["takeover"], false);
    assert_eq!(body["ttlMs"], 1_800_000);
    let token = body["token"].as_str().unwrap().to_string();
    assert!(token.starts_with("sess_"));

    let (status, body) = send(
        &app,
        get(&format!("/check?identity=a@x&profile=P1&token={}", token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert!(body["expiresInMs"].as_i64().unwrap() > 0);

    let (status, body) = send(
        &app,
        post_json("/touch", json!({"identity": "a@x", "profile": "P1", "token": token})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (status, body) = send(
        &app,
        post_json("/logout", json!({"identity": "a@x", "token": token})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["outcome"], "terminated");

    let (_, body) = send(
        &app,
        get(&format!("/check?identity=a@x&profile=P1&token={}", token)),
    )
    .await;
    assert_eq!(body["ok"], false);
    assert_eq!(body["reason"], "expired");
}

#[tokio::test]
async fn test_takeover_over_http_with_original_field_names() {
    let app = test_app();

    let (_, first) = send(&app, get("/auth?email=a@x&code=1234&profileId=P1")).await;
    let first_token = first["sessionId"].as_str().unwrap().to_string();
    assert_eq!(first["token"], first_token.as_str());

    let request = Request::builder()
        .method("POST")
        .uri("/auth")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
        .body(Body::from("email=a%40x&code=1234&profileId=P2"))
        .unwrap();
    let (status, second) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["takeover"], true);
    assert_eq!(second["previous"]["profile"], "P1");

    let (_, body) = send(
        &app,
        get(&format!("/check?email=a@x&profileId=P1&sessionId={}", first_token)),
    )
    .await;
    assert_eq!(body["ok"], false);
    assert_eq!(body["reason"], "superseded");

    // The displaced client cannot sign out the new holder.
    let (_, body) = send(
        &app,
        post_json("/logout", json!({"email": "a@x", "sessionId": first_token})),
    )
    .await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["outcome"], "already_superseded");

    let (_, body) = send(
        &app,
        post_json("/logout", json!({"email": "a@x", "profileId": "P1"})),
    )
    .await;
    assert_eq!(body["ok"], false);
    assert_eq!(body["outcome"], "different_profile");

    let (_, list) = send(
        &app,
        Request::builder()
            .uri("/admin/sessions")
            .header(ADMIN_KEY_HEADER, ADMIN_KEY)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(list["count"], 1);
    assert_eq!(list["sessions"][0]["profile"], "P2");
    assert_eq!(list["sessions"][0]["origin"], "203.0.113.9");
}

#[tokio::test]
async fn test_auth_errors() {
    let app = test_app();

    let (status, body) = send(&app, post_json("/auth", json!({"identity": "a@x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
    assert!(body["msg"].as_str().unwrap().contains("required"));

    let (status, body) = send(
        &app,
        post_json("/auth", json!({"identity": "a@x", "secret": "0000", "profile": "P1"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["ok"], false);

    let (status, _) = send(&app, get("/check?identity=a@x")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_listing_requires_key() {
    let app = test_app();

    let (status, body) = send(&app, get("/admin/sessions")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["ok"], false);

    let (status, _) = send(
        &app,
        Request::builder()
            .uri("/admin/sessions")
            .header(ADMIN_KEY_HEADER, "wrong-key-wrong-key")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Request::builder()
            .uri("/admin/sessions")
            .header(ADMIN_KEY_HEADER, ADMIN_KEY)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = test_app();

    let (status, body) = send(&app, get("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["service"], "pmp-session-api");

    let response = app.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
