//! Session provider: turns the server-side session into a validated claim.

use crate::models::{CurrentUser, UserProfile};
use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use mart_core::access::{Role, SessionClaim};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const USER_KEY: &str = "user";
pub const RETURN_TO_KEY: &str = "return_to";

/// Claims of the HS256 token the backend issues at sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(alias = "sub")]
    pub user_id: String,
    pub role: Role,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session store error: {0}")]
    Store(#[from] tower_sessions::session::Error),

    #[error("invalid session token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Validate a session token and extract its claim.
    fn verify(&self, token: &str) -> Result<SessionClaim, SessionError>;

    /// Resolve the signed-in user behind `session`, if any.
    ///
    /// `Ok(None)` means no one is signed in; an error means the session
    /// could not be checked. Callers treat both as signed out.
    async fn resolve(&self, session: &Session) -> Result<Option<CurrentUser>, SessionError> {
        let Some(access_token) = session.get::<String>(ACCESS_TOKEN_KEY).await? else {
            return Ok(None);
        };

        let claim = self.verify(&access_token)?;
        let profile = session.get::<UserProfile>(USER_KEY).await?;

        Ok(Some(CurrentUser {
            claim,
            profile,
            access_token,
        }))
    }
}

pub struct JwtSessionProvider {
    key: DecodingKey,
    validation: Validation,
}

impl JwtSessionProvider {
    pub fn new(secret: &Secret<String>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        Self {
            key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl SessionProvider for JwtSessionProvider {
    fn verify(&self, token: &str) -> Result<SessionClaim, SessionError> {
        let data = decode::<TokenClaims>(token, &self.key, &self.validation)?;
        Ok(SessionClaim {
            user_id: data.claims.user_id,
            role: data.claims.role,
        })
    }
}

/// Store a freshly exchanged identity and rotate the session id.
pub async fn establish(
    session: &Session,
    token: &str,
    profile: &UserProfile,
) -> Result<(), SessionError> {
    session.cycle_id().await?;
    session.insert(ACCESS_TOKEN_KEY, token).await?;
    session.insert(USER_KEY, profile).await?;
    Ok(())
}
