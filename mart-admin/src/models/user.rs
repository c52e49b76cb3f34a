use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use mart_core::access::{Role, SessionClaim};
use serde::{Deserialize, Serialize};

/// Display profile returned by the backend at sign-in.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: String,
    pub role: Role,
}

impl UserProfile {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.email.split('@').next().unwrap_or("User")
        } else {
            &self.name
        }
    }

    pub fn initials(&self) -> String {
        let initials: String = self
            .display_name()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .take(2)
            .collect::<String>()
            .to_uppercase();
        if initials.is_empty() {
            "U".to_string()
        } else {
            initials
        }
    }
}

/// Signed-in user for the current request.
///
/// Put into request extensions by the access gate once it has allowed the
/// request; handlers take it as an extractor.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub claim: SessionClaim,
    pub profile: Option<UserProfile>,
    pub access_token: String,
}

impl CurrentUser {
    pub fn role(&self) -> Role {
        self.claim.role
    }

    pub fn display_name(&self) -> String {
        match &self.profile {
            Some(profile) => profile.display_name().to_string(),
            None => self.claim.user_id.clone(),
        }
    }

    pub fn email(&self) -> &str {
        self.profile
            .as_ref()
            .map(|p| p.email.as_str())
            .unwrap_or_default()
    }

    pub fn initials(&self) -> String {
        match &self.profile {
            Some(profile) => profile.initials(),
            None => "U".to_string(),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<CurrentUser>().cloned().ok_or_else(|| {
            tracing::error!(path = %parts.uri.path(), "Handler reached without a gated session");
            (StatusCode::INTERNAL_SERVER_ERROR, "Session context missing").into_response()
        })
    }
}
