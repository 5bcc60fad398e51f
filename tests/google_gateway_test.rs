use axum::extract::{Form, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use catalog_backend::config::OAuthConfig;
use catalog_backend::util::google_oauth::{GatewayError, GoogleGateway, IdentityGateway};
use serde_json::json;
use std::collections::HashMap;
use tokio::net::TcpListener;

async fn token(Form(params): Form<HashMap<String, String>>) -> impl IntoResponse {
    if params.get("grant_type").map(String::as_str) != Some("authorization_code")
        || params.get("client_secret").map(String::as_str) != Some("test-client-secret")
    {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "invalid_client" })));
    }
    match params.get("code").map(String::as_str) {
        Some("good") => (
            StatusCode::OK,
            Json(json!({
                "access_token": "at-1",
                "refresh_token": "rt-1",
                "expires_in": 3599,
                "token_type": "Bearer"
            })),
        ),
        Some("no-token") => (StatusCode::OK, Json(json!({ "token_type": "Bearer" }))),
        _ => (StatusCode::BAD_REQUEST, Json(json!({ "error": "invalid_grant" }))),
    }
}

async fn userinfo(headers: HeaderMap) -> impl IntoResponse {
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if bearer != "Bearer at-1" {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "invalid_token" })));
    }
    (
        StatusCode::OK,
        Json(json!({
            "id": "1234567890",
            "email": "Ana@Example.com",
            "verified_email": true,
            "name": "Ana Gómez",
            "picture": "https://example.com/ana.png"
        })),
    )
}

async fn revoke(Query(params): Query<HashMap<String, String>>) -> StatusCode {
    match params.get("token").map(String::as_str) {
        Some("rt-1") => StatusCode::OK,
        _ => StatusCode::BAD_REQUEST,
    }
}

/// Serves a stand-in provider on an ephemeral port.
async fn spawn_provider() -> String {
    let app = Router::new()
        .route("/token", post(token))
        .route("/userinfo", get(userinfo))
        .route("/revoke", post(revoke));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn gateway() -> GoogleGateway {
    let base = spawn_provider().await;
    GoogleGateway::new(OAuthConfig::for_provider(&base)).unwrap()
}

#[tokio::test]
async fn test_exchange_code_success() {
    let gateway = gateway().await;
    let tokens = gateway.exchange_code("good").await.unwrap();
    assert_eq!(tokens.access_token, "at-1");
    assert_eq!(tokens.refresh_token.as_deref(), Some("rt-1"));
    assert_eq!(tokens.expires_in, Some(3599));
}

#[tokio::test]
async fn test_exchange_code_without_access_token() {
    let gateway = gateway().await;
    let err = gateway.exchange_code("no-token").await.unwrap_err();
    assert!(matches!(err, GatewayError::MissingToken));
}

#[tokio::test]
async fn test_exchange_code_rejected() {
    let gateway = gateway().await;
    match gateway.exchange_code("expired").await.unwrap_err() {
        GatewayError::Status { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("invalid_grant"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_user_info() {
    let gateway = gateway().await;
    let info = gateway.fetch_user_info("at-1").await.unwrap();
    assert_eq!(info.google_id(), Some("1234567890"));
    assert_eq!(info.email_verified, Some(true));

    let identity = info.into_identity().unwrap();
    assert_eq!(identity.email.as_deref(), Some("ana@example.com"));
    assert_eq!(identity.google_id, "1234567890");
}

#[tokio::test]
async fn test_fetch_user_info_bad_token() {
    let gateway = gateway().await;
    let err = gateway.fetch_user_info("stale").await.unwrap_err();
    assert!(matches!(err, GatewayError::Status { status: 401, .. }));
}

#[tokio::test]
async fn test_revoke_token() {
    let gateway = gateway().await;
    assert!(gateway.revoke_token("rt-1").await.is_ok());
    assert!(gateway.revoke_token("unknown").await.is_err());
}

#[tokio::test]
async fn test_unreachable_provider_is_request_error() {
    // Bind then drop to get a port with nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let gateway = GoogleGateway::new(OAuthConfig::for_provider(&format!("http://{}", addr))).unwrap();
    let err = gateway.exchange_code("good").await.unwrap_err();
    assert!(matches!(err, GatewayError::Request(_)));
}
