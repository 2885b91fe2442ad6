//! Thread list page of a channel: list, create, delete the channel, back.

use axum::extract::rejection::FormRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Form, Router};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::AsyncPgConnection;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::middleware::AuthUser;
use crate::error::ApiError;
use crate::forms::{
    self, FormSpec, PageAction, ThreadInput, ThreadPageForm, ThreadRejection, INVALID_INPUT,
};
use crate::models::channel::{self, Channel, ChannelView};
use crate::models::name_list::NameList;
use crate::models::settings;
use crate::models::thread::{self, ThreadView};
use crate::page::{paths, Navigate, Page, CHANNEL_BANNED, LOGIN_REQUIRED};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/channel/{channel}/", get(list_threads).post(post_threads))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ThreadListPage {
    pub channel: ChannelView,
    pub threads: Vec<ThreadView>,
}

// ---------------------------------------------------------------------------
// GET /channel/:channel/
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/channel/{channel}/",
    tag = "Threads",
    params(("channel" = String, Path, description = "Channel name")),
    responses(
        (status = 200, description = "The channel's threads plus the create form"),
        (status = 404, description = "Channel not found", body = crate::error::ApiErrorBody),
    ),
)]
pub async fn list_threads(
    auth: Option<AuthUser>,
    State(state): State<AppState>,
    Path(channel_name): Path<String>,
) -> Result<Page<ThreadListPage>, ApiError> {
    let mut conn = state.db.get().await?;

    let ch = channel::get_by_name(&mut conn, &channel_name).await?;
    let owner = channel::owner_username(&mut conn, &ch).await?;
    let favorites = match &auth {
        Some(user) => settings::favorites_of(&mut conn, &user.user_id).await?,
        None => NameList::default(),
    };

    let threads = thread::list_for_channel(&mut conn, &ch.id)
        .await?
        .into_iter()
        .map(|(t, owner)| t.view(owner))
        .collect();

    Ok(Page::Both {
        form: FormSpec::thread(paths::threads(&ch.channel_name)),
        object: ThreadListPage {
            channel: ch.view(owner, &favorites)?,
            threads,
        },
    })
}

// ---------------------------------------------------------------------------
// POST /channel/:channel/
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/channel/{channel}/",
    tag = "Threads",
    params(("channel" = String, Path, description = "Channel name")),
    responses(
        (
            status = 303,
            description = "To the new thread, the channel list, or back to this page",
            body = crate::page::NavigateBody
        ),
        (status = 404, description = "Channel not found", body = crate::error::ApiErrorBody),
    ),
)]
pub async fn post_threads(
    auth: Option<AuthUser>,
    State(state): State<AppState>,
    Path(channel_name): Path<String>,
    form: Result<Form<ThreadPageForm>, FormRejection>,
) -> Result<Navigate, ApiError> {
    let mut conn = state.db.get().await?;
    let ch = channel::get_by_name(&mut conn, &channel_name).await?;
    let here = paths::threads(&ch.channel_name);

    let Some(form) = forms::accept(form) else {
        return Ok(Navigate::to(here).error(INVALID_INPUT));
    };

    match form.action() {
        PageAction::Create(input) => create_thread(&mut conn, auth, &ch, input).await,
        PageAction::Delete => {
            channel::delete_by_name(&mut conn, &ch.channel_name).await?;
            tracing::info!(
                channel = %ch.channel_name,
                by = auth.as_ref().map(|u| u.username.as_str()).unwrap_or("anonymous"),
                "channel deleted"
            );
            Ok(Navigate::to(paths::CHANNELS))
        }
        PageAction::Back => Ok(Navigate::to(paths::CHANNELS)),
        PageAction::Unknown => Ok(Navigate::to(here).error(INVALID_INPUT)),
    }
}

async fn create_thread(
    conn: &mut AsyncPgConnection,
    auth: Option<AuthUser>,
    ch: &Channel,
    input: ThreadInput,
) -> Result<Navigate, ApiError> {
    let here = paths::threads(&ch.channel_name);
    let Some(owner) = auth else {
        return Ok(Navigate::to(here).error(LOGIN_REQUIRED));
    };
    if ch.is_banned(&owner.username)? {
        return Ok(Navigate::to(here).error(CHANNEL_BANNED));
    }

    let exists = thread::name_exists(conn, &ch.id, &input.thread_name).await?;
    if let Err(rejection) = forms::validate_thread(&input, exists) {
        tracing::debug!(?rejection, channel = %ch.channel_name, "thread rejected");
        return Ok(Navigate::to(here).error(rejection.message()));
    }

    match thread::insert(
        conn,
        &ch.id,
        &input.thread_name,
        &input.description,
        &owner.user_id,
    )
    .await
    {
        Ok(created) => {
            tracing::info!(
                channel = %ch.channel_name,
                thread_id = created.thread_id,
                owner = %owner.username,
                "thread created"
            );
            Ok(Navigate::to(paths::comments(&ch.channel_name, created.thread_id)))
        }
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            Ok(Navigate::to(here).error(ThreadRejection::AlreadyExists.message()))
        }
        Err(err) => Err(err.into()),
    }
}
