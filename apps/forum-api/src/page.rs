//! What a handler hands back: a page context for the presentation layer, or
//! a redirect carrying the messages queued while handling the request.

use axum::http::header::LOCATION;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::forms::FormSpec;

/// Page context, tagged by what the page carries.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Page<T> {
    Form { form: FormSpec },
    Object { object: T },
    Both { form: FormSpec, object: T },
}

impl<T: Serialize> IntoResponse for Page<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FlashMessage {
    pub level: Level,
    pub text: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NavigateBody {
    pub redirect: String,
    pub messages: Vec<FlashMessage>,
}

/// `303 See Other` to the next page, with any queued messages in the body.
#[derive(Debug)]
pub struct Navigate {
    pub location: String,
    pub messages: Vec<FlashMessage>,
}

impl Navigate {
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            messages: Vec::new(),
        }
    }

    pub fn error(mut self, text: impl Into<String>) -> Self {
        self.push_error(text);
        self
    }

    pub fn push_error(&mut self, text: impl Into<String>) {
        self.messages.push(FlashMessage {
            level: Level::Error,
            text: text.into(),
        });
    }
}

impl IntoResponse for Navigate {
    fn into_response(self) -> Response {
        let location = match HeaderValue::try_from(self.location.as_str()) {
            Ok(value) => value,
            Err(err) => {
                tracing::error!(?err, location = %self.location, "unencodable redirect target");
                return ApiError::internal("An internal error occurred").into_response();
            }
        };
        let body = NavigateBody {
            redirect: self.location,
            messages: self.messages,
        };
        (StatusCode::SEE_OTHER, [(LOCATION, location)], Json(body)).into_response()
    }
}

/// Canonical page paths.
pub mod paths {
    pub const CHANNELS: &str = "/channel/";
    pub const FAVORITES: &str = "/favorites/";
    pub const SETTINGS: &str = "/settings/";

    pub fn threads(channel: &str) -> String {
        format!("/channel/{channel}/")
    }

    pub fn comments(channel: &str, thread_id: i32) -> String {
        format!("/channel/{channel}/{thread_id}/")
    }

    pub fn user(username: &str) -> String {
        format!("/user/{username}/")
    }
}

pub const LOGIN_REQUIRED: &str = "You must be logged in to do that.";
pub const NOT_PERMITTED: &str = "You do not have permission to do that.";
pub const CHANNEL_BANNED: &str = "You are banned from this channel.";

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn navigate_is_a_see_other_with_messages() {
        let resp = Navigate::to(paths::CHANNELS)
            .error("Invalid input.")
            .into_response();

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[LOCATION], "/channel/");

        let body = body_json(resp).await;
        assert_eq!(body["redirect"], "/channel/");
        assert_eq!(body["messages"][0]["level"], "error");
        assert_eq!(body["messages"][0]["text"], "Invalid input.");
    }

    #[tokio::test]
    async fn unencodable_location_is_an_internal_error() {
        let resp = Navigate::to("/user/bad\nname/").into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn page_kinds_are_tagged() {
        let page: Page<Vec<u8>> = Page::Object { object: vec![1] };
        let body = body_json(page.into_response()).await;
        assert_eq!(body["kind"], "object");
        assert_eq!(body["object"][0], 1);

        let page: Page<()> = Page::Form {
            form: FormSpec::comment("/channel/general/1/"),
        };
        let body = body_json(page.into_response()).await;
        assert_eq!(body["kind"], "form");
        assert_eq!(body["form"]["fields"][0]["name"], "text");
    }

    #[test]
    fn paths_use_natural_keys() {
        assert_eq!(paths::threads("general"), "/channel/general/");
        assert_eq!(paths::comments("general", 3), "/channel/general/3/");
        assert_eq!(paths::user("alice"), "/user/alice/");
    }
}
