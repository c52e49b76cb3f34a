mod common;

use axum::{http::StatusCode, Router};
use common::{
    app_with, body_text, get_request, location, BrokenSession, FixedSession, UNREACHABLE_BACKEND,
};
use mart_core::access::Role;
use std::sync::Arc;
use tower::util::ServiceExt;

fn signed_in_as(role: Option<Role>) -> Router {
    app_with(UNREACHABLE_BACKEND, Arc::new(FixedSession(role)))
}

#[tokio::test]
async fn anonymous_request_is_sent_to_sign_in_with_return_target() {
    let response = signed_in_as(None)
        .oneshot(get_request("/products", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/signin?from=%2Fproducts");
}

#[tokio::test]
async fn return_target_keeps_the_query_string() {
    let response = signed_in_as(None)
        .oneshot(get_request("/deliveries?status=%E9%85%8D%E9%80%81%E4%B8%AD&page=2", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let target = location(&response)
        .strip_prefix("/auth/signin?from=")
        .unwrap()
        .to_string();
    assert_eq!(
        urlencoding::decode(&target).unwrap(),
        "/deliveries?status=%E9%85%8D%E9%80%81%E4%B8%AD&page=2"
    );
}

#[tokio::test]
async fn insufficient_role_is_sent_to_unauthorized() {
    let response = signed_in_as(Some(Role::Staff))
        .oneshot(get_request("/settings", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/unauthorized");
}

#[tokio::test]
async fn viewer_reaches_dashboard() {
    let response = signed_in_as(Some(Role::Viewer))
        .oneshot(get_request("/dashboard", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("viewer"));
    // Viewers only see the pages their role can open
    assert!(!body.contains("Products"));
    assert!(!body.contains("Settings"));
}

#[tokio::test]
async fn signed_in_user_is_bounced_off_sign_in_page() {
    let response = signed_in_as(Some(Role::Admin))
        .oneshot(get_request("/auth/signin", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn anonymous_user_sees_sign_in_page() {
    let response = signed_in_as(None)
        .oneshot(get_request("/auth/signin?from=%2Finventory", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("inventory"));
}

#[tokio::test]
async fn foreign_return_target_is_replaced_with_landing() {
    let response = signed_in_as(None)
        .oneshot(get_request("/auth/signin?from=https%3A%2F%2Fevil.example", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(!body.contains("evil.example"));
    assert!(body.contains("dashboard"));
}

#[tokio::test]
async fn admin_reaches_settings() {
    let response = signed_in_as(Some(Role::Admin))
        .oneshot(get_request("/settings", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("products"));
    assert!(body.contains("Route policy"));
}

#[tokio::test]
async fn unauthorized_page_is_open_to_any_signed_in_user() {
    let response = signed_in_as(Some(Role::Viewer))
        .oneshot(get_request("/unauthorized", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Go to dashboard"));
    // No same-origin referer, so no way back to offer
    assert!(!body.contains("Previous page"));
}

#[tokio::test]
async fn failing_session_check_counts_as_signed_out() {
    let app = app_with(UNREACHABLE_BACKEND, Arc::new(BrokenSession));

    let response = app
        .clone()
        .oneshot(get_request("/dashboard", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/signin?from=%2Fdashboard");

    // Sign-in stays reachable
    let response = app.oneshot(get_request("/auth/signin", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn public_paths_skip_the_session_check() {
    let app = app_with(UNREACHABLE_BACKEND, Arc::new(BrokenSession));

    let response = app
        .clone()
        .oneshot(get_request("/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");

    let response = app.oneshot(get_request("/metrics", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn responses_carry_request_id_and_security_headers() {
    let response = signed_in_as(None)
        .oneshot(get_request("/health", None))
        .await
        .unwrap();

    let headers = response.headers();
    assert!(headers.contains_key("x-request-id"));
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
}

#[tokio::test]
async fn same_request_gets_the_same_decision() {
    let app = signed_in_as(Some(Role::Staff));

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(get_request("/settings?tab=policy", None))
            .await
            .unwrap();
        assert_eq!(location(&response), "/unauthorized");
    }
}
