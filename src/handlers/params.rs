// Request parameter extraction shared by the session endpoints

use crate::error::SessionError;
use axum::{
    Form, Json, async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::{HeaderMap, Method, header::CONTENT_TYPE},
};
use serde::de::DeserializeOwned;
use std::net::SocketAddr;

/// Origin recorded when nothing better is known
const UNKNOWN_ORIGIN: &str = "unknown";

/// Parameters read from the query string on GET and from a JSON or
/// url-encoded body otherwise.
pub struct RequestParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for RequestParams<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = SessionError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if req.method() == Method::GET || req.method() == Method::HEAD {
            let (mut parts, _body) = req.into_parts();
            let Query(params) = Query::<T>::from_request_parts(&mut parts, state)
                .await
                .map_err(|e| SessionError::Validation(e.body_text()))?;
            return Ok(Self(params));
        }

        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if is_json {
            let Json(params) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| SessionError::Validation(e.body_text()))?;
            Ok(Self(params))
        } else {
            let Form(params) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| SessionError::Validation(e.body_text()))?;
            Ok(Self(params))
        }
    }
}

/// Resolve the caller's network origin.
///
/// First `X-Forwarded-For` entry, then `X-Real-IP`, then the socket peer.
pub fn client_origin(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    header("x-forwarded-for")
        .or_else(|| header("x-real-ip"))
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN_ORIGIN.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::HeaderValue;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Params {
        #[serde(alias = "email")]
        identity: String,
        #[serde(alias = "profileId")]
        profile: String,
    }

    async fn extract(req: Request) -> Result<Params, SessionError> {
        RequestParams::<Params>::from_request(req, &())
            .await
            .map(|RequestParams(p)| p)
    }

    #[tokio::test]
    async fn test_get_reads_query() {
        let req = Request::builder()
            .method(Method::GET)
            .uri("/check?email=a%40x&profileId=P1")
            .body(Body::empty())
            .unwrap();

        let params = extract(req).await.unwrap();
        assert_eq!(params.identity, "a@x");
        assert_eq!(params.profile, "P1");
    }

    #[tokio::test]
    async fn test_post_reads_json() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/auth")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"identity":"a@x","profile":"P1"}"#))
            .unwrap();

        let params = extract(req).await.unwrap();
        assert_eq!(params.identity, "a@x");
        assert_eq!(params.profile, "P1");
    }

    #[tokio::test]
    async fn test_post_reads_form() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/auth")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("identity=a%40x&profile=P2"))
            .unwrap();

        let params = extract(req).await.unwrap();
        assert_eq!(params.identity, "a@x");
        assert_eq!(params.profile, "P2");
    }

    #[tokio::test]
    async fn test_bad_json_is_validation_error() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/auth")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        assert!(matches!(extract(req).await, Err(SessionError::Validation(_))));
    }

    #[test]
    fn test_client_origin_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("10.9.9.9"));
        let peer: SocketAddr = "127.0.0.1:5000".parse().unwrap();

        assert_eq!(client_origin(&headers, Some(peer)), "203.0.113.7");
    }

    #[test]
    fn test_client_origin_fallbacks() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.9.9.9"));
        assert_eq!(client_origin(&headers, None), "10.9.9.9");

        let peer: SocketAddr = "192.168.0.4:5000".parse().unwrap();
        assert_eq!(client_origin(&HeaderMap::new(), Some(peer)), "192.168.0.4");
        assert_eq!(client_origin(&HeaderMap::new(), None), UNKNOWN_ORIGIN);
    }
}
