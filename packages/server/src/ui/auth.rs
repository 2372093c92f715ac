//! Bearer token extractor for the HTTP API.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::domain::{AuthError, Identity, User};

use super::{error::ApiError, state::AppState};

/// The caller's verified identity. Every authenticated request also records
/// the user, so teammates can later add them by email.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split_once(' '))
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
            .map(|(_, token)| token.trim())
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let identity = state.token_verifier.verify(token)?;

        let user = User {
            id: identity.user_id,
            email: identity.email.clone(),
            name: identity.name.clone(),
        };
        if let Err(e) = state.user_repository.upsert(user).await {
            tracing::warn!("Failed to record user '{}': {}", identity.user_id, e);
        }

        Ok(AuthUser(identity))
    }
}
