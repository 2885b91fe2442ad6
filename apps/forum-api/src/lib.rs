pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod models;
pub mod page;
pub mod permissions;
pub mod routes;

use std::sync::Arc;

use db::kv::KeyValueStore;
use db::pool::DbPool;
use forum_common::SnowflakeGenerator;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub kv: Arc<dyn KeyValueStore>,
    pub snowflake: Arc<SnowflakeGenerator>,
}
