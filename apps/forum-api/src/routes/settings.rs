//! Per-user settings page.

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::routing::get;
use axum::{Form, Router};

use crate::auth::middleware::AuthUser;
use crate::error::ApiError;
use crate::forms::{self, FormSpec, SettingsForm, INVALID_INPUT};
use crate::models::settings::{self, SettingsView};
use crate::page::{paths, Navigate, Page, LOGIN_REQUIRED};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/settings/", get(get_settings).post(save_settings))
}

// ---------------------------------------------------------------------------
// GET /settings/
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/settings/",
    tag = "Settings",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The caller's settings plus the edit form"),
        (status = 401, description = "Not authenticated", body = crate::error::ApiErrorBody),
    ),
)]
pub async fn get_settings(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Page<SettingsView>, ApiError> {
    let mut conn = state.db.get().await?;
    let row = settings::get_or_create(&mut conn, &auth.user_id).await?;

    Ok(Page::Both {
        form: FormSpec::settings(paths::SETTINGS),
        object: row.view()?,
    })
}

// ---------------------------------------------------------------------------
// POST /settings/
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/settings/",
    tag = "Settings",
    security(("bearer" = [])),
    responses((
        status = 303,
        description = "Back to the settings page",
        body = crate::page::NavigateBody
    )),
)]
pub async fn save_settings(
    auth: Option<AuthUser>,
    State(state): State<AppState>,
    form: Result<Form<SettingsForm>, FormRejection>,
) -> Result<Navigate, ApiError> {
    let nav = Navigate::to(paths::SETTINGS);
    let Some(user) = auth else {
        return Ok(nav.error(LOGIN_REQUIRED));
    };

    let Some(form) = forms::accept(form) else {
        return Ok(nav.error(INVALID_INPUT));
    };

    let changes = match form.validate() {
        Ok(changes) => changes,
        Err(message) => return Ok(nav.error(message)),
    };

    let mut conn = state.db.get().await?;
    settings::get_or_create(&mut conn, &user.user_id).await?;

    if let Some(favorites) = changes.favorites {
        settings::save_favorites(&mut conn, &user.user_id, &favorites).await?;
        tracing::info!(
            user = %user.username,
            count = favorites.as_slice().len(),
            "favorites saved"
        );
    }

    Ok(nav)
}
