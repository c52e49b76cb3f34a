//! Sign-in, provider callback and sign-out.

use crate::services::session::{self, ACCESS_TOKEN_KEY, RETURN_TO_KEY};
use crate::AppState;
use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use mart_core::access::AccessGate;
use serde::Deserialize;
use tower_sessions::Session;

#[derive(Template)]
#[template(path = "signin.html")]
pub struct SignInTemplate {
    pub from: String,
}

#[derive(Template)]
#[template(path = "auth_error.html")]
pub struct AuthErrorTemplate {
    pub sign_in: String,
}

#[derive(Deserialize)]
pub struct SignInQuery {
    pub from: Option<String>,
}

#[derive(Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    pub from: Option<String>,
}

#[derive(Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// Location of the sign-in error page, under the auth-flow prefix.
pub fn auth_error_path(gate: &AccessGate) -> String {
    format!("{}/error", gate.paths().auth_prefix.trim_end_matches('/'))
}

pub async fn sign_in_page(
    State(state): State<AppState>,
    Query(query): Query<SignInQuery>,
) -> impl IntoResponse {
    SignInTemplate {
        from: state.gate.sanitize_return_target(query.from.as_deref()),
    }
}

pub async fn auth_error_page(State(state): State<AppState>) -> impl IntoResponse {
    AuthErrorTemplate {
        sign_in: state.gate.paths().sign_in.clone(),
    }
}

/// Remember where to return and hand the browser to the identity provider.
pub async fn start_sign_in(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignInForm>,
) -> Response {
    let return_to = state.gate.sanitize_return_target(form.from.as_deref());

    if let Err(e) = session.insert(RETURN_TO_KEY, &return_to).await {
        tracing::error!(error = %e, "Failed to store return target in session");
        return Redirect::to(&auth_error_path(&state.gate)).into_response();
    }

    match state.identity.authorization_url().await {
        Ok(url) => {
            tracing::info!(return_to = %return_to, "Redirecting to identity provider");
            Redirect::to(&url).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to obtain provider authorization URL");
            Redirect::to(&auth_error_path(&state.gate)).into_response()
        }
    }
}

/// Complete the provider hand-off and open a session.
pub async fn sign_in_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
    session: Session,
) -> Response {
    let error_location = auth_error_path(&state.gate);

    let Some(code) = params.code.filter(|code| !code.is_empty()) else {
        tracing::warn!(
            provider_error = params.error.as_deref().unwrap_or("-"),
            "Sign-in callback without authorization code"
        );
        return Redirect::to(&error_location).into_response();
    };

    let identity = match state.identity.exchange(&code).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::error!(error = %e, "Identity exchange failed");
            return Redirect::to(&error_location).into_response();
        }
    };

    let claim = match state.sessions.verify(&identity.token) {
        Ok(claim) => claim,
        Err(e) => {
            tracing::error!(error = %e, "Identity provider issued an unverifiable token");
            return Redirect::to(&error_location).into_response();
        }
    };

    let return_to: Option<String> = session.get(RETURN_TO_KEY).await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to read return target from session");
        None
    });

    if let Err(e) = session::establish(&session, &identity.token, &identity.user).await {
        tracing::error!(error = %e, "Failed to store signed-in session");
        return Redirect::to(&error_location).into_response();
    }
    if let Err(e) = session.remove::<String>(RETURN_TO_KEY).await {
        tracing::warn!(error = %e, "Failed to clear return target");
    }

    let target = state.gate.sanitize_return_target(return_to.as_deref());
    tracing::info!(
        user_id = %claim.user_id,
        role = %claim.role,
        target = %target,
        "User signed in"
    );

    Redirect::to(&target).into_response()
}

pub async fn sign_out(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    match session.get::<String>(ACCESS_TOKEN_KEY).await {
        Ok(Some(token)) => state.identity.sign_out(&token).await,
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Failed to read session during sign-out"),
    }

    // Clear the session regardless of the backend's answer
    if let Err(e) = session.flush().await {
        tracing::error!(error = %e, "Failed to flush session during sign-out");
    }

    Redirect::to(&state.gate.paths().sign_in)
}
