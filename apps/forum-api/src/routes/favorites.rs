//! Favorites page, plus the favorite toggle shared with the channel list.

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::routing::get;
use axum::{Form, Router};

use crate::auth::middleware::AuthUser;
use crate::error::ApiError;
use crate::forms::{self, FavoriteForm, FavoriteToggle, INVALID_INPUT};
use crate::models::name_list::ListEdit;
use crate::models::{channel, settings};
use crate::page::{paths, Navigate, Page, LOGIN_REQUIRED};
use crate::routes::channels::ChannelList;
use crate::AppState;

pub const ALREADY_FAVORITE: &str = "Channel is already in your favorites.";
pub const NOT_FAVORITE: &str = "Channel is not in your favorites.";

pub fn router() -> Router<AppState> {
    Router::new().route("/favorites/", get(list_favorites).post(post_favorites))
}

// ---------------------------------------------------------------------------
// GET /favorites/
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/favorites/",
    tag = "Favorites",
    responses((status = 200, description = "The caller's favorite channels; empty when anonymous")),
)]
pub async fn list_favorites(
    auth: Option<AuthUser>,
    State(state): State<AppState>,
) -> Result<Page<ChannelList>, ApiError> {
    let Some(user) = auth else {
        return Ok(Page::Object {
            object: ChannelList::default(),
        });
    };

    let mut conn = state.db.get().await?;
    let favorites = settings::favorites_of(&mut conn, &user.user_id).await?;
    let rows = channel::list_named(&mut conn, favorites.as_slice()).await?;

    let channels = rows
        .into_iter()
        .map(|(ch, owner)| ch.view(owner, &favorites))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page::Object {
        object: ChannelList { channels },
    })
}

// ---------------------------------------------------------------------------
// POST /favorites/
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/favorites/",
    tag = "Favorites",
    responses(
        (
            status = 303,
            description = "Back to the favorites page",
            body = crate::page::NavigateBody
        ),
        (
            status = 404,
            description = "Channel to favorite does not exist",
            body = crate::error::ApiErrorBody
        ),
    ),
)]
pub async fn post_favorites(
    auth: Option<AuthUser>,
    State(state): State<AppState>,
    form: Result<Form<FavoriteForm>, FormRejection>,
) -> Result<Navigate, ApiError> {
    match forms::accept(form).and_then(|form| form.toggle()) {
        Some(toggle) => toggle_favorite(&state, auth.as_ref(), toggle, paths::FAVORITES).await,
        None => Ok(Navigate::to(paths::FAVORITES).error(INVALID_INPUT)),
    }
}

/// Add or remove a channel from the caller's favorites, then return to `back`.
/// Asking for the state the list is already in is a no-op with a message.
pub async fn toggle_favorite(
    state: &AppState,
    auth: Option<&AuthUser>,
    toggle: FavoriteToggle,
    back: &str,
) -> Result<Navigate, ApiError> {
    let nav = Navigate::to(back);
    let Some(user) = auth else {
        return Ok(nav.error(LOGIN_REQUIRED));
    };

    let mut conn = state.db.get().await?;

    match toggle {
        FavoriteToggle::Add(name) => {
            channel::get_by_name(&mut conn, &name).await?;
            if !settings::edit_favorites(&mut conn, &user.user_id, ListEdit::Insert, &name).await? {
                return Ok(nav.error(ALREADY_FAVORITE));
            }
            tracing::info!(user = %user.username, channel = %name, "channel favorited");
        }
        FavoriteToggle::Remove(name) => {
            if !settings::edit_favorites(&mut conn, &user.user_id, ListEdit::RemoveFirst, &name)
                .await?
            {
                return Ok(nav.error(NOT_FAVORITE));
            }
            tracing::info!(user = %user.username, channel = %name, "channel unfavorited");
        }
    }

    Ok(nav)
}
