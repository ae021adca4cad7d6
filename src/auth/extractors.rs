use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::{jwt::JwtKeys, repo_types::User, services};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

/// The authenticated caller, passed explicitly into every owner-scoped call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub public_id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<&User> for Identity {
    fn from(u: &User) -> Self {
        Self {
            user_id: u.id,
            public_id: u.public_id,
            username: u.username.clone(),
            email: u.email.clone(),
        }
    }
}

/// Rows that belong to exactly one user.
pub trait Owned {
    fn owner_id(&self) -> i64;
}

impl Identity {
    /// Ownership re-check for resources already loaded in this request. A
    /// mismatch looks exactly like a missing row.
    pub fn authorize<R: Owned>(&self, resource: &R) -> AppResult<()> {
        if resource.owner_id() == self.user_id {
            Ok(())
        } else {
            warn!(user_id = self.user_id, owner_id = resource.owner_id(), "ownership check failed");
            Err(AppError::NotFound)
        }
    }
}

/// Extracts the bearer token, verifies it and resolves the subject.
pub struct AuthUser(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| {
                warn!("authorization header is missing");
                AppError::InvalidToken
            })?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                warn!("authorization header is malformed");
                AppError::InvalidToken
            })?;

        let keys = JwtKeys::from_ref(state);
        let subject = services::verify_auth_token(&keys, token)?;
        let identity = services::resolve_identity(state, subject).await?;
        Ok(AuthUser(identity))
    }
}
