use super::layout::Chrome;
use crate::models::CurrentUser;
use crate::AppState;
use askama::Template;
use axum::{extract::State, response::IntoResponse};

#[derive(Template)]
#[template(path = "pages/dashboard.html")]
pub struct DashboardTemplate {
    pub chrome: Chrome,
    pub user_id: String,
    pub email: String,
    pub picture: String,
}

pub async fn dashboard_page(State(state): State<AppState>, user: CurrentUser) -> impl IntoResponse {
    tracing::debug!(user_id = %user.claim.user_id, "Rendering dashboard");

    DashboardTemplate {
        chrome: Chrome::new(&state.gate, &user, &state.gate.paths().landing),
        user_id: user.claim.user_id.clone(),
        email: user.email().to_string(),
        picture: user
            .profile
            .as_ref()
            .map(|p| p.picture.clone())
            .unwrap_or_default(),
    }
}
