//! Session extraction.

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::auth::tokens;
use crate::error::ApiError;
use crate::models::user;
use crate::AppState;

/// Authenticated, active user resolved from `Authorization: Bearer <token>`.
///
/// Take `AuthUser` in handlers that must reject anonymous callers with 401,
/// or `Option<AuthUser>` where anonymous callers get a page or a message.
/// Accounts deactivated by an admin resolve as anonymous.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub username: String,
    pub is_admin: bool,
}

async fn resolve(parts: &Parts, state: &AppState) -> Result<Option<AuthUser>, ApiError> {
    let Some(token) = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
    else {
        return Ok(None);
    };

    let Some(session) = tokens::lookup_session(state.kv.as_ref(), token.trim()).await? else {
        return Ok(None);
    };

    let mut conn = state.db.get().await?;
    let user = user::find_by_id(&mut conn, &session.user_id).await?;

    Ok(user.filter(|u| u.is_active).map(|u| AuthUser {
        user_id: u.id,
        username: u.username,
        is_admin: u.is_staff,
    }))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve(parts, state)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        resolve(parts, state).await
    }
}
