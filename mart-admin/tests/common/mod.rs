//! Shared setup for mart-admin integration tests.
//!
//! Pages are driven through the real router with `oneshot`; the NEXT MART
//! backend is a small axum app served on an ephemeral port.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use mart_admin::config::{BackendSettings, ServerSettings};
use mart_admin::models::CurrentUser;
use mart_admin::services::{BackendClient, JwtSessionProvider, SessionError, SessionProvider};
use mart_admin::startup::build_router;
use mart_admin::AppState;
use mart_core::access::{AccessGate, GatePaths, Role, RoutePolicy, SessionClaim};
use secrecy::Secret;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_sessions::Session;

pub const SECRET: &str = "integration-secret";
pub const PROVIDER_URL: &str = "https://accounts.example.com/o/oauth2/auth?client_id=mart";
pub const GOOD_CODE: &str = "good-code";

/// Backend address nothing listens on, for tests that never reach it.
pub const UNREACHABLE_BACKEND: &str = "http://127.0.0.1:9";

pub fn mint_token(role: &str) -> String {
    let claims = json!({
        "user_id": "u-100",
        "role": role,
        "exp": (Utc::now() + Duration::minutes(30)).timestamp(),
    });
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn server_settings() -> ServerSettings {
    ServerSettings {
        host: "127.0.0.1".to_string(),
        port: 0,
        secure_cookies: false,
        session_inactivity_minutes: 30,
        static_dir: "static".to_string(),
    }
}

pub fn gate() -> AccessGate {
    AccessGate::new(RoutePolicy::default(), GatePaths::default()).unwrap()
}

pub fn app_with(backend_url: &str, sessions: Arc<dyn SessionProvider>) -> Router {
    let backend = Arc::new(
        BackendClient::new(&BackendSettings {
            url: backend_url.to_string(),
            timeout_seconds: 2,
        })
        .unwrap(),
    );
    let state = AppState::new(gate(), sessions, backend.clone(), backend);
    build_router(state, &server_settings())
}

/// Router wired to the real JWT session provider.
pub fn app(backend_url: &str) -> Router {
    app_with(
        backend_url,
        Arc::new(JwtSessionProvider::new(&Secret::new(SECRET.to_string()))),
    )
}

/// Session provider that reports the same signed-in user for every request.
pub struct FixedSession(pub Option<Role>);

#[async_trait]
impl SessionProvider for FixedSession {
    fn verify(&self, _token: &str) -> Result<SessionClaim, SessionError> {
        self.0
            .map(|role| SessionClaim {
                user_id: "u-1".to_string(),
                role,
            })
            .ok_or_else(|| SessionError::InvalidToken(jsonwebtoken::errors::ErrorKind::InvalidToken.into()))
    }

    async fn resolve(&self, _session: &Session) -> Result<Option<CurrentUser>, SessionError> {
        Ok(self.0.map(|role| CurrentUser {
            claim: SessionClaim {
                user_id: "u-1".to_string(),
                role,
            },
            profile: None,
            access_token: "fixed-token".to_string(),
        }))
    }
}

/// Session provider whose session check always fails.
pub struct BrokenSession;

#[async_trait]
impl SessionProvider for BrokenSession {
    fn verify(&self, _token: &str) -> Result<SessionClaim, SessionError> {
        Err(SessionError::InvalidToken(
            jsonwebtoken::errors::ErrorKind::InvalidSignature.into(),
        ))
    }

    async fn resolve(&self, _session: &Session) -> Result<Option<CurrentUser>, SessionError> {
        Err(SessionError::InvalidToken(
            jsonwebtoken::errors::ErrorKind::InvalidSignature.into(),
        ))
    }
}

pub fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn form_request(uri: &str, form: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(form.to_string())).unwrap()
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("response has a Location header")
        .to_str()
        .unwrap()
}

/// `name=value` of the session cookie set by `response`, if any.
pub fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .find(|pair| pair.starts_with("id="))
        .map(str::to_string)
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// Fake backend

#[derive(Clone)]
struct FakeBackend {
    token: String,
}

fn authorized(headers: &HeaderMap, backend: &FakeBackend) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map_or(false, |value| value == format!("Bearer {}", backend.token))
}

#[derive(Deserialize)]
struct CodeQuery {
    code: String,
}

async fn authorization_url() -> Json<serde_json::Value> {
    Json(json!({ "url": PROVIDER_URL }))
}

async fn exchange(
    State(backend): State<FakeBackend>,
    Query(query): Query<CodeQuery>,
) -> Response {
    if query.code != GOOD_CODE {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "invalid code" })))
            .into_response();
    }

    Json(json!({
        "token": backend.token,
        "user": {
            "id": "u-100",
            "email": "hana.sato@nextmart.example",
            "name": "Hana Sato",
            "picture": "",
            "role": "staff"
        }
    }))
    .into_response()
}

async fn logout() -> Json<serde_json::Value> {
    Json(json!({ "success": true }))
}

fn product(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "sku": format!("SKU-{id}"),
        "price": 298.0,
        "stock": 12,
        "status": "販売中",
        "updatedAt": "2030-01-02T03:04:05Z"
    })
}

async fn list_products(State(backend): State<FakeBackend>, headers: HeaderMap) -> Response {
    if !authorized(&headers, &backend) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "products": [product("p1", "Oat milk")],
        "total": 1,
        "page": 1,
        "perPage": 20
    }))
    .into_response()
}

async fn get_product(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !authorized(&headers, &backend) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if id != "p1" {
        return (StatusCode::NOT_FOUND, Json(json!({ "message": "not found" }))).into_response();
    }
    Json(product("p1", "Oat milk")).into_response()
}

async fn create_product(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    if !authorized(&headers, &backend) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let name = body["name"].as_str().unwrap_or_default();
    (StatusCode::CREATED, Json(product("p2", name))).into_response()
}

async fn product_histories(State(backend): State<FakeBackend>, headers: HeaderMap) -> Response {
    if !authorized(&headers, &backend) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "histories": [{
            "id": "h1",
            "productId": "p1",
            "productName": "Oat milk",
            "type": "入庫",
            "quantity": 24,
            "reason": "Weekly restock",
            "createdAt": "2030-01-01T09:00:00Z",
            "createdBy": "u-100"
        }],
        "total": 1,
        "page": 1,
        "perPage": 10
    }))
    .into_response()
}

fn delivery() -> serde_json::Value {
    json!({
        "id": "d1",
        "deliveryType": "drone",
        "address": "Shibuya 1-2-3",
        "estimatedDeliveryTime": "2030-05-01T10:00:00Z",
        "status": "配送中",
        "notes": "Leave at door"
    })
}

async fn get_delivery(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !authorized(&headers, &backend) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if id != "d1" {
        return (StatusCode::NOT_FOUND, Json(json!({ "message": "not found" }))).into_response();
    }
    Json(delivery()).into_response()
}

/// Accepts only the edit sent by `pages_test`.
async fn update_delivery(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    if !authorized(&headers, &backend) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let expected = json!({
        "status": "配送完了",
        "notes": "Left at reception",
        "actualDeliveryTime": "2030-05-01T10:30:00Z"
    });
    if body != expected {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "unexpected body" })))
            .into_response();
    }

    let mut updated = delivery();
    updated["status"] = body["status"].clone();
    updated["notes"] = body["notes"].clone();
    updated["actualDeliveryTime"] = body["actualDeliveryTime"].clone();
    Json(updated).into_response()
}

/// Rejects every token, as a backend does after revoking a session.
async fn revoked() -> StatusCode {
    StatusCode::UNAUTHORIZED
}

/// Serve the fake backend and return its base URL. `token` is the only
/// bearer token it accepts.
pub async fn spawn_backend(token: String) -> String {
    let router = Router::new()
        .route("/api/auth/google", get(authorization_url))
        .route("/api/auth/google/callback", get(exchange))
        .route("/api/auth/logout", post(logout))
        .route("/api/products", get(list_products).post(create_product))
        .route("/api/products/:id", get(get_product))
        .route("/api/inventory/products/:id/histories", get(product_histories))
        .route("/api/deliveries", get(revoked))
        .route("/api/deliveries/:id", get(get_delivery).patch(update_delivery))
        .route("/api/deliveries/:id/status", patch(revoked))
        .with_state(FakeBackend { token });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{address}")
}

/// Run the sign-in flow against `app` and return the session cookie.
pub async fn sign_in(app: &Router) -> String {
    use tower::util::ServiceExt;

    let response = app
        .clone()
        .oneshot(form_request("/api/auth/signin", "", None))
        .await
        .unwrap();
    let cookie = session_cookie(&response).unwrap();

    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/api/auth/callback?code={GOOD_CODE}"),
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    session_cookie(&response).unwrap_or(cookie)
}
