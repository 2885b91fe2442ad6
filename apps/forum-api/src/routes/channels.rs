//! Channel list page: list, create, favorite toggles.

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::routing::get;
use axum::{Form, Router};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::middleware::AuthUser;
use crate::error::ApiError;
use crate::forms::{
    self, ChannelAction, ChannelInput, ChannelPageForm, ChannelRejection, FavoriteToggle, FormSpec,
    INVALID_INPUT,
};
use crate::models::channel::{self, ChannelView};
use crate::models::name_list::NameList;
use crate::models::settings;
use crate::page::{paths, Navigate, Page, LOGIN_REQUIRED};
use crate::routes::favorites;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/channel/", get(list_channels).post(post_channels))
}

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct ChannelList {
    pub channels: Vec<ChannelView>,
}

// ---------------------------------------------------------------------------
// GET /channel/
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/channel/",
    tag = "Channels",
    responses((status = 200, description = "All channels plus the create form")),
)]
pub async fn list_channels(
    auth: Option<AuthUser>,
    State(state): State<AppState>,
) -> Result<Page<ChannelList>, ApiError> {
    let mut conn = state.db.get().await?;

    let favorites = match &auth {
        Some(user) => settings::favorites_of(&mut conn, &user.user_id).await?,
        None => NameList::default(),
    };

    let channels = channel::list_with_owners(&mut conn)
        .await?
        .into_iter()
        .map(|(ch, owner)| ch.view(owner, &favorites))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page::Both {
        form: FormSpec::channel(paths::CHANNELS),
        object: ChannelList { channels },
    })
}

// ---------------------------------------------------------------------------
// POST /channel/
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/channel/",
    tag = "Channels",
    responses(
        (
            status = 303,
            description = "To the new channel on success, back to the list otherwise",
            body = crate::page::NavigateBody
        ),
        (
            status = 404,
            description = "Channel to favorite does not exist",
            body = crate::error::ApiErrorBody
        ),
    ),
)]
pub async fn post_channels(
    auth: Option<AuthUser>,
    State(state): State<AppState>,
    form: Result<Form<ChannelPageForm>, FormRejection>,
) -> Result<Navigate, ApiError> {
    let Some(form) = forms::accept(form) else {
        return Ok(Navigate::to(paths::CHANNELS).error(INVALID_INPUT));
    };

    match form.action() {
        ChannelAction::Favorite(name) => {
            favorites::toggle_favorite(
                &state,
                auth.as_ref(),
                FavoriteToggle::Add(name),
                paths::CHANNELS,
            )
            .await
        }
        ChannelAction::Unfavorite(name) => {
            favorites::toggle_favorite(
                &state,
                auth.as_ref(),
                FavoriteToggle::Remove(name),
                paths::CHANNELS,
            )
            .await
        }
        ChannelAction::Create(input) => create_channel(&state, auth, input).await,
    }
}

async fn create_channel(
    state: &AppState,
    auth: Option<AuthUser>,
    input: ChannelInput,
) -> Result<Navigate, ApiError> {
    let Some(owner) = auth else {
        return Ok(Navigate::to(paths::CHANNELS).error(LOGIN_REQUIRED));
    };

    let mut conn = state.db.get().await?;

    let exists = channel::name_exists(&mut conn, &input.channel_name).await?;
    if let Err(rejection) = forms::validate_channel(&input, exists) {
        tracing::debug!(?rejection, channel = %input.channel_name, "channel rejected");
        return Ok(Navigate::to(paths::CHANNELS).error(rejection.message()));
    }

    let inserted =
        channel::insert(&mut conn, &input.channel_name, &input.description, &owner.user_id).await;
    match inserted {
        Ok(created) => {
            tracing::info!(
                channel = %created.channel_name,
                owner = %owner.username,
                "channel created"
            );
            Ok(Navigate::to(paths::threads(&created.channel_name)))
        }
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => Ok(
            Navigate::to(paths::CHANNELS).error(ChannelRejection::AlreadyExists.message()),
        ),
        Err(err) => Err(err.into()),
    }
}
