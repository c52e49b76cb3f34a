//! Access gate applied to every request.

use crate::services::metrics::record_decision;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use mart_core::access::Decision;
use tower_sessions::Session;

pub async fn access_gate_middleware(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    if state.gate.is_public(&path) {
        record_decision(Decision::Public.outcome());
        return next.run(request).await;
    }

    let user = match state.sessions.resolve(&session).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "Session check failed, treating as signed out");
            None
        }
    };

    let query = request.uri().query().map(str::to_string);
    let decision = state
        .gate
        .decide(&path, query.as_deref(), user.as_ref().map(|u| &u.claim));
    record_decision(decision.outcome());

    let Some(location) = decision.location() else {
        if let Some(user) = user {
            request.extensions_mut().insert(user);
        }

        let is_get = request.method() == Method::GET;
        let response = next.run(request).await;

        // The backend refused the session token mid-request. Drop the session
        // so the sign-in page does not bounce a still-valid claim to landing.
        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::info!(path = %path, "Backend rejected session token, redirecting to sign-in");
            if let Err(e) = session.flush().await {
                tracing::error!(error = %e, "Failed to clear rejected session");
            }
            // Only a GET can be replayed after sign-in; form posts land on landing
            let location = if is_get {
                state.gate.sign_in_location(&path, query.as_deref())
            } else {
                state.gate.paths().sign_in.clone()
            };
            return Redirect::to(&location).into_response();
        }
        return response;
    };

    tracing::info!(
        path = %path,
        outcome = decision.outcome(),
        user_id = user.as_ref().map(|u| u.claim.user_id.as_str()).unwrap_or("-"),
        "Access gate redirect"
    );
    Redirect::to(location).into_response()
}
