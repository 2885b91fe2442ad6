#![allow(dead_code)]

use std::sync::Arc;

use axum::http::header::{AUTHORIZATION, LOCATION};
use axum::http::HeaderValue;
use axum::Router;
use axum_test::{TestResponse, TestServer};

use forum_api::auth::tokens::{self, SessionData};
use forum_api::config::{with_test_db_suffix, Config};
use forum_api::db::kv::{KeyValueStore, MemoryStore};
use forum_api::db::pool::DbPool;
use forum_api::models::user::{self, User};
use forum_api::AppState;
use forum_common::SnowflakeGenerator;

/// Build a test AppState with an in-memory session store, pointed at the
/// `_test` database.
pub async fn test_state() -> AppState {
    let env_path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    let _ = dotenvy::from_path(env_path);

    let mut config = Config::from_env();
    config.database_url = with_test_db_suffix(&config.database_url);

    let db = forum_api::db::pool::connect(&config.database_url, config.db_pool_size).await;
    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

    AppState {
        db,
        kv,
        snowflake: Arc::new(SnowflakeGenerator::new(1)),
    }
}

/// Build the full application router wired to the test state.
pub async fn test_app() -> (Router, AppState) {
    let state = test_state().await;
    let app = forum_api::routes::router().with_state(state.clone());
    (app, state)
}

pub async fn test_server() -> (TestServer, AppState) {
    let (app, state) = test_app().await;
    (TestServer::new(app).unwrap(), state)
}

/// A unique, path-safe name with the given prefix.
pub fn unique(prefix: &str) -> String {
    forum_common::id::prefixed_ulid(prefix).to_lowercase()
}

/// Create a user directly (accounts come from the external auth service).
pub async fn create_user(db: &DbPool, is_admin: bool) -> User {
    let mut conn = db.get().await.expect("pool");
    user::upsert_by_username(&mut conn, &unique("u"), is_admin)
        .await
        .expect("create user")
}

/// Issue a session for `user` and return the bearer header value.
pub async fn login(state: &AppState, user: &User) -> HeaderValue {
    let token = tokens::generate_session_token();
    tokens::store_session(
        state.kv.as_ref(),
        &token,
        &SessionData {
            user_id: user.id.clone(),
        },
    )
    .await
    .expect("store session");
    HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
}

/// Location header of a redirect response.
pub fn location(resp: &TestResponse) -> String {
    resp.header(LOCATION).to_str().unwrap().to_string()
}

/// Texts of the messages queued on a redirect response.
pub fn messages(resp: &TestResponse) -> Vec<String> {
    let body: serde_json::Value = resp.json();
    body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["text"].as_str().unwrap().to_string())
        .collect()
}

/// Create a channel as the caller behind `auth` and return its name.
pub async fn create_channel(server: &TestServer, auth: &HeaderValue) -> String {
    let name = unique("ch");
    server
        .post("/channel/")
        .add_header(AUTHORIZATION, auth.clone())
        .form(&[
            ("create", "1"),
            ("channel_name", name.as_str()),
            ("description", "A channel for tests"),
        ])
        .await
        .assert_status(axum::http::StatusCode::SEE_OTHER);
    name
}

/// Create a thread in `channel` and return its per-channel id.
pub async fn create_thread(server: &TestServer, auth: &HeaderValue, channel: &str) -> i32 {
    let resp = server
        .post(&format!("/channel/{channel}/"))
        .add_header(AUTHORIZATION, auth.clone())
        .form(&[
            ("create", "1"),
            ("thread_name", "First thread"),
            ("description", "Something to talk about"),
        ])
        .await;
    resp.assert_status(axum::http::StatusCode::SEE_OTHER);
    let location = location(&resp);
    location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap()
        .parse()
        .unwrap()
}

/// Delete a channel by name (CASCADE handles threads and comments).
pub async fn cleanup_channel(db: &DbPool, channel_name: &str) {
    use diesel::prelude::*;
    use diesel_async::RunQueryDsl;

    let mut conn = db.get().await.expect("pool");
    diesel::delete(
        forum_api::db::schema::channels::table
            .filter(forum_api::db::schema::channels::channel_name.eq(channel_name)),
    )
    .execute(&mut conn)
    .await
    .ok();
}

/// Delete a user (CASCADE handles settings). Channels they own must be
/// cleaned up first.
pub async fn cleanup_user(db: &DbPool, user_id: &str) {
    use diesel::prelude::*;
    use diesel_async::RunQueryDsl;

    let mut conn = db.get().await.expect("pool");
    diesel::delete(
        forum_api::db::schema::users::table.filter(forum_api::db::schema::users::id.eq(user_id)),
    )
    .execute(&mut conn)
    .await
    .ok();
}
