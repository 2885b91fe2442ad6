//! User profile page and the moderation actions posted from it.

use axum::extract::rejection::FormRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Form, Router};
use diesel_async::AsyncPgConnection;

use crate::auth::middleware::AuthUser;
use crate::error::ApiError;
use crate::forms::{self, ModerationAction, ModerationForm, Role, INVALID_INPUT};
use crate::models::channel::{self, ChannelList};
use crate::models::name_list::ListEdit;
use crate::models::user::{self, User, UserProfile};
use crate::page::{paths, Navigate, Page, LOGIN_REQUIRED, NOT_PERMITTED};
use crate::permissions;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/user/{username}/", get(get_profile).post(post_moderation))
}

// ---------------------------------------------------------------------------
// GET /user/:username/
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/user/{username}/",
    tag = "Users",
    params(("username" = String, Path, description = "Username")),
    responses((
        status = 200,
        description = "Public profile, or a null object for unknown users",
        body = UserProfile
    )),
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Page<Option<UserProfile>>, ApiError> {
    let mut conn = state.db.get().await?;

    let profile = match user::find_by_username(&mut conn, &username).await? {
        Some(found) => Some(user::load_profile(&mut conn, found).await?),
        None => None,
    };

    Ok(Page::Object { object: profile })
}

// ---------------------------------------------------------------------------
// POST /user/:username/
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/user/{username}/",
    tag = "Users",
    params(("username" = String, Path, description = "Username the actions apply to")),
    responses(
        (
            status = 303,
            description = "Back to the profile, with one message per refused action",
            body = crate::page::NavigateBody
        ),
        (
            status = 404,
            description = "User or channel not found",
            body = crate::error::ApiErrorBody
        ),
    ),
)]
pub async fn post_moderation(
    auth: Option<AuthUser>,
    State(state): State<AppState>,
    Path(username): Path<String>,
    form: Result<Form<ModerationForm>, FormRejection>,
) -> Result<Navigate, ApiError> {
    let mut conn = state.db.get().await?;

    let target = user::find_by_username(&mut conn, &username)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let mut nav = Navigate::to(paths::user(&target.username));

    let Some(form) = forms::accept(form) else {
        return Ok(nav.error(INVALID_INPUT));
    };
    let actions = form.actions();
    if actions.is_empty() {
        return Ok(nav.error(INVALID_INPUT));
    }
    let Some(caller) = auth else {
        return Ok(nav.error(LOGIN_REQUIRED));
    };

    for action in actions {
        if !apply(&mut conn, &caller, &target, &action).await? {
            tracing::warn!(
                caller = %caller.username,
                target = %target.username,
                ?action,
                "moderation action refused"
            );
            nav.push_error(NOT_PERMITTED);
        }
    }

    Ok(nav)
}

/// Run one moderation action. Returns false when the caller lacks the
/// privilege for it; a list edit that changes nothing still counts as done.
async fn apply(
    conn: &mut AsyncPgConnection,
    caller: &AuthUser,
    target: &User,
    action: &ModerationAction,
) -> Result<bool, ApiError> {
    let (channel_name, role, list, edit) = match action {
        ModerationAction::AdminBan | ModerationAction::AdminUnban => {
            if !caller.is_admin {
                return Ok(false);
            }
            let active = matches!(action, ModerationAction::AdminUnban);
            user::set_active(conn, &target.id, active).await?;
            tracing::info!(
                admin = %caller.username,
                target = %target.username,
                active,
                "account active flag set"
            );
            return Ok(true);
        }
        ModerationAction::Ban { channel, role } => {
            (channel, *role, ChannelList::BannedUsers, ListEdit::Append)
        }
        ModerationAction::Unban { channel, role } => {
            (channel, *role, ChannelList::BannedUsers, ListEdit::RemoveFirst)
        }
        ModerationAction::AddModerator { channel } => {
            (channel, Role::Owner, ChannelList::Moderators, ListEdit::Insert)
        }
        ModerationAction::RemoveModerator { channel } => {
            (channel, Role::Owner, ChannelList::Moderators, ListEdit::RemoveFirst)
        }
    };

    let ch = channel::get_by_name(conn, channel_name).await?;
    if !permissions::may_act(caller, &ch, role)? {
        return Ok(false);
    }

    let changed = channel::edit_list(conn, &ch.id, list, edit, &target.username).await?;
    tracing::info!(
        by = %caller.username,
        target = %target.username,
        channel = %ch.channel_name,
        ?list,
        ?edit,
        changed,
        "channel list edited"
    );
    Ok(true)
}
