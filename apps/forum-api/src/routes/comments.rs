//! Thread page: the comments of one thread, posting, deleting the thread.

use axum::extract::rejection::FormRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Form, Router};
use chrono::Utc;
use diesel_async::AsyncPgConnection;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::middleware::AuthUser;
use crate::error::ApiError;
use crate::forms::{self, CommentPageForm, FormSpec, PageAction, INVALID_INPUT};
use crate::models::channel::{self, Channel, ChannelView};
use crate::models::comment::{self, CommentView};
use crate::models::name_list::NameList;
use crate::models::settings;
use crate::models::thread::{self, Thread, ThreadView};
use crate::page::{paths, Navigate, Page, CHANNEL_BANNED, LOGIN_REQUIRED};
use crate::permissions;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/channel/{channel}/{thread}/",
        get(list_comments).post(post_comments),
    )
}

/// Thread numbers that do not parse name no thread.
fn thread_number(raw: &str) -> Result<i32, ApiError> {
    raw.parse().map_err(|_| ApiError::not_found("Thread not found"))
}

/// `is_owner` refers to the thread; `is_moderator` to its channel.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct ViewerFlags {
    pub is_owner: bool,
    pub is_moderator: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommentListPage {
    pub channel: ChannelView,
    pub thread: ThreadView,
    pub viewer: ViewerFlags,
    pub comments: Vec<CommentView>,
}

// ---------------------------------------------------------------------------
// GET /channel/:channel/:thread/
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/channel/{channel}/{thread}/",
    tag = "Comments",
    params(
        ("channel" = String, Path, description = "Channel name"),
        ("thread" = i32, Path, description = "Thread number within the channel"),
    ),
    responses(
        (status = 200, description = "The thread's comments plus the reply form"),
        (status = 404, description = "Thread not found", body = crate::error::ApiErrorBody),
    ),
)]
pub async fn list_comments(
    auth: Option<AuthUser>,
    State(state): State<AppState>,
    Path((channel_name, thread)): Path<(String, String)>,
) -> Result<Page<CommentListPage>, ApiError> {
    let thread_id = thread_number(&thread)?;
    let mut conn = state.db.get().await?;

    let (th, ch) = thread::get(&mut conn, &channel_name, thread_id).await?;
    let channel_owner = channel::owner_username(&mut conn, &ch).await?;
    let thread_owner = thread::owner_username(&mut conn, &th).await?;

    let (favorites, viewer) = match &auth {
        Some(user) => (
            settings::favorites_of(&mut conn, &user.user_id).await?,
            ViewerFlags {
                is_owner: user.user_id == th.owner_id,
                is_moderator: permissions::is_moderator(user, &ch)?,
            },
        ),
        None => (NameList::default(), ViewerFlags::default()),
    };

    let now = Utc::now();
    let comments = comment::list_for_thread(&mut conn, &th)
        .await?
        .into_iter()
        .map(|(c, owner)| c.view(owner, now))
        .collect();

    Ok(Page::Both {
        form: FormSpec::comment(paths::comments(&ch.channel_name, th.thread_id)),
        object: CommentListPage {
            channel: ch.view(channel_owner, &favorites)?,
            thread: th.view(thread_owner),
            viewer,
            comments,
        },
    })
}

// ---------------------------------------------------------------------------
// POST /channel/:channel/:thread/
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/channel/{channel}/{thread}/",
    tag = "Comments",
    params(
        ("channel" = String, Path, description = "Channel name"),
        ("thread" = i32, Path, description = "Thread number within the channel"),
    ),
    responses(
        (
            status = 303,
            description = "Back to this thread, or to the channel after a delete",
            body = crate::page::NavigateBody
        ),
        (status = 404, description = "Thread not found", body = crate::error::ApiErrorBody),
    ),
)]
pub async fn post_comments(
    auth: Option<AuthUser>,
    State(state): State<AppState>,
    Path((channel_name, thread)): Path<(String, String)>,
    form: Result<Form<CommentPageForm>, FormRejection>,
) -> Result<Navigate, ApiError> {
    let thread_id = thread_number(&thread)?;
    let mut conn = state.db.get().await?;
    let (th, ch) = thread::get(&mut conn, &channel_name, thread_id).await?;
    let here = paths::comments(&ch.channel_name, th.thread_id);

    let Some(form) = forms::accept(form) else {
        return Ok(Navigate::to(here).error(INVALID_INPUT));
    };

    match form.action() {
        PageAction::Create(text) => {
            let id = state.snowflake.generate();
            create_comment(&mut conn, auth, &ch, &th, id, &text).await
        }
        PageAction::Delete => {
            thread::delete(&mut conn, &th).await?;
            tracing::info!(
                channel = %ch.channel_name,
                thread_id = th.thread_id,
                by = auth.as_ref().map(|u| u.username.as_str()).unwrap_or("anonymous"),
                "thread deleted"
            );
            Ok(Navigate::to(paths::threads(&ch.channel_name)))
        }
        PageAction::Back => Ok(Navigate::to(paths::threads(&ch.channel_name))),
        PageAction::Unknown => Ok(Navigate::to(here).error(INVALID_INPUT)),
    }
}

async fn create_comment(
    conn: &mut AsyncPgConnection,
    auth: Option<AuthUser>,
    ch: &Channel,
    th: &Thread,
    id: i64,
    text: &str,
) -> Result<Navigate, ApiError> {
    let here = paths::comments(&ch.channel_name, th.thread_id);
    let Some(owner) = auth else {
        return Ok(Navigate::to(here).error(LOGIN_REQUIRED));
    };
    if ch.is_banned(&owner.username)? {
        return Ok(Navigate::to(here).error(CHANNEL_BANNED));
    }
    if let Err(message) = forms::validate_comment(text) {
        return Ok(Navigate::to(here).error(message));
    }

    let created = comment::insert(conn, id, th, text, &owner.user_id).await?;
    tracing::info!(
        channel = %ch.channel_name,
        thread_id = th.thread_id,
        comment_id = created.id,
        owner = %owner.username,
        "comment posted"
    );

    Ok(Navigate::to(here))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn thread_number_parses_digits() {
        assert_eq!(thread_number("7").ok(), Some(7));
    }

    #[test]
    fn thread_number_rejects_non_numbers_as_not_found() {
        for raw in ["abc", "", "1.5", "99999999999"] {
            let err = thread_number(raw).unwrap_err();
            assert_eq!(err.status, StatusCode::NOT_FOUND, "{raw:?}");
            assert_eq!(err.message, "Thread not found");
        }
    }
}
