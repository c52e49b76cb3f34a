use super::layout::Chrome;
use crate::models::CurrentUser;
use crate::AppState;
use askama::Template;
use axum::{extract::State, response::IntoResponse};

pub struct PolicyRow {
    pub prefix: String,
    pub role: String,
}

#[derive(Template)]
#[template(path = "pages/settings.html")]
pub struct SettingsTemplate {
    pub chrome: Chrome,
    pub policy: Vec<PolicyRow>,
    pub sign_in: String,
    pub auth_prefix: String,
    pub unauthorized: String,
    pub landing: String,
    pub public_prefixes: Vec<String>,
}

/// Read-only view of the active route policy and redirect paths.
pub async fn settings_page(State(state): State<AppState>, user: CurrentUser) -> impl IntoResponse {
    let paths = state.gate.paths();
    let policy = state
        .gate
        .policy()
        .entries()
        .iter()
        .map(|entry| PolicyRow {
            prefix: entry.prefix.clone(),
            role: entry.role.to_string(),
        })
        .collect();

    SettingsTemplate {
        chrome: Chrome::new(&state.gate, &user, "/settings"),
        policy,
        sign_in: paths.sign_in.clone(),
        auth_prefix: paths.auth_prefix.clone(),
        unauthorized: paths.unauthorized.clone(),
        landing: paths.landing.clone(),
        public_prefixes: paths.public_prefixes.clone(),
    }
}
