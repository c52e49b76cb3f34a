//! Sign-in hand-off to the external identity provider.
//!
//! Every provider collapses to the same two steps: where to send the
//! browser, and trading the returned authorization code for a signed
//! session token plus the user's profile.

use super::backend_client::{BackendClient, BackendError};
use crate::models::UserProfile;
use async_trait::async_trait;
use serde::Deserialize;

/// Result of a completed sign-in exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct SignedIdentity {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("identity provider unavailable: {0}")]
    Unavailable(#[from] BackendError),

    #[error("identity provider response is missing '{0}'")]
    Malformed(&'static str),
}

#[async_trait]
pub trait IdentityExchange: Send + Sync {
    /// Location that starts the provider's sign-in flow.
    async fn authorization_url(&self) -> Result<String, ExchangeError>;

    /// Trade an authorization code for a signed identity.
    async fn exchange(&self, code: &str) -> Result<SignedIdentity, ExchangeError>;

    /// Tell the provider the session ended. Failures are only logged.
    async fn sign_out(&self, token: &str);
}

#[derive(Deserialize)]
struct AuthorizationUrl {
    url: Option<String>,
}

/// Google sign-in brokered by the backend (`/api/auth/google/...`).
#[async_trait]
impl IdentityExchange for BackendClient {
    async fn authorization_url(&self) -> Result<String, ExchangeError> {
        let body: AuthorizationUrl = self.get_json("/api/auth/google", None, &()).await?;
        body.url
            .filter(|url| !url.is_empty())
            .ok_or(ExchangeError::Malformed("url"))
    }

    async fn exchange(&self, code: &str) -> Result<SignedIdentity, ExchangeError> {
        let identity: SignedIdentity = self
            .get_json("/api/auth/google/callback", None, &[("code", code)])
            .await?;

        if identity.token.is_empty() {
            return Err(ExchangeError::Malformed("token"));
        }

        tracing::info!(
            user_id = %identity.user.id,
            role = %identity.user.role,
            "Identity exchange completed"
        );
        Ok(identity)
    }

    async fn sign_out(&self, token: &str) {
        match self
            .post_json("/api/auth/logout", Some(token), &serde_json::json!({}))
            .await
        {
            Ok(_) => tracing::info!("Backend session revoked"),
            Err(e) => tracing::warn!(error = %e, "Failed to revoke backend session during sign-out"),
        }
    }
}
