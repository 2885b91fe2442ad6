pub mod channels;
pub mod comments;
pub mod favorites;
pub mod health;
pub mod settings;
pub mod threads;
pub mod users;

use axum::Router;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(channels::router())
        .merge(threads::router())
        .merge(comments::router())
        .merge(users::router())
        .merge(favorites::router())
        .merge(settings::router())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health,
        // Channels
        channels::list_channels,
        channels::post_channels,
        // Threads
        threads::list_threads,
        threads::post_threads,
        // Comments
        comments::list_comments,
        comments::post_comments,
        // Users
        users::get_profile,
        users::post_moderation,
        // Favorites
        favorites::list_favorites,
        favorites::post_favorites,
        // Settings
        settings::get_settings,
        settings::save_settings,
    ),
    components(
        schemas(
            // Error types
            crate::error::ApiErrorBody,
            crate::error::ApiErrorDetail,
            // Page contexts
            crate::forms::FormSpec,
            crate::forms::FieldSpec,
            crate::page::Level,
            crate::page::FlashMessage,
            crate::page::NavigateBody,
            // Models
            crate::models::channel::ChannelView,
            crate::models::thread::ThreadView,
            crate::models::comment::CommentView,
            crate::models::user::UserProfile,
            crate::models::settings::SettingsView,
            // Route response types
            channels::ChannelList,
            threads::ThreadListPage,
            comments::CommentListPage,
            comments::ViewerFlags,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check"),
        (name = "Channels", description = "Channel list and creation"),
        (name = "Threads", description = "Threads of a channel"),
        (name = "Comments", description = "Comments of a thread"),
        (name = "Users", description = "Profiles and moderation"),
        (name = "Favorites", description = "Favorite channels"),
        (name = "Settings", description = "Per-user settings"),
    )
)]
pub struct ApiDoc;
