use crate::AppState;
use askama::Template;
use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect},
};

pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    Redirect::to(&state.gate.paths().landing)
}

pub async fn health_check() -> &'static str {
    "OK"
}

#[derive(Template)]
#[template(path = "unauthorized.html")]
pub struct UnauthorizedTemplate {
    /// Same-origin page the user came from, empty when unknown.
    pub back: String,
    pub landing: String,
}

/// Informational page for an authorization failure; always offers a way out.
pub async fn unauthorized(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let landing = state.gate.paths().landing.clone();
    let back = previous_page(&headers)
        .map(|target| state.gate.sanitize_return_target(Some(&target)))
        .filter(|target| target != &landing && target != &state.gate.paths().unauthorized)
        .unwrap_or_default();

    UnauthorizedTemplate { back, landing }
}

/// Path and query of the `Referer`, when it points at this host.
fn previous_page(headers: &HeaderMap) -> Option<String> {
    let referer = headers.get(header::REFERER)?.to_str().ok()?;
    let host = headers.get(header::HOST)?.to_str().ok()?;
    let url = reqwest::Url::parse(referer).ok()?;

    let referer_host = match url.port() {
        Some(port) => format!("{}:{}", url.host_str()?, port),
        None => url.host_str()?.to_string(),
    };
    if referer_host != host {
        return None;
    }

    Some(match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    })
}
