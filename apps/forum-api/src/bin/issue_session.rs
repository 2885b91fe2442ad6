//! Development helper standing in for the external auth service.
//!
//! Usage:
//!   cargo run -p forum-api --bin issue-session -- <username> [--admin]
//!   cargo run -p forum-api --bin issue-session -- --revoke <token>
//!
//! Creates the user if needed, writes a session into Redis and prints the
//! bearer token. Requires DATABASE_URL and REDIS_URL.

use std::path::Path;
use std::process::ExitCode;

use forum_api::auth::tokens::{self, SessionData};
use forum_api::config::Config;
use forum_api::db::kv::RedisStore;
use forum_api::models::user;

const USAGE: &str = "usage: issue-session <username> [--admin] | --revoke <token>";

#[tokio::main]
async fn main() -> ExitCode {
    if dotenvy::dotenv().is_err() {
        let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(env_path);
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = Config::from_env();

    let Some(redis_url) = config.redis_url.as_deref() else {
        eprintln!("REDIS_URL is required: sessions must be visible to the server");
        return ExitCode::FAILURE;
    };
    let kv = RedisStore::connect(redis_url)
        .await
        .expect("failed to connect to redis");

    if let Some(pos) = args.iter().position(|a| a == "--revoke") {
        let Some(token) = args.get(pos + 1) else {
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        };
        tokens::revoke_session(&kv, token)
            .await
            .expect("failed to revoke session");
        println!("Revoked {token}");
        return ExitCode::SUCCESS;
    }

    let Some(username) = args.iter().find(|a| !a.starts_with("--")) else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };
    let is_admin = args.iter().any(|a| a == "--admin");

    let db = forum_api::db::pool::connect(&config.database_url, 1).await;
    let mut conn = db.get().await.expect("failed to get connection");
    let account = user::upsert_by_username(&mut conn, username, is_admin)
        .await
        .expect("failed to upsert user");

    let token = tokens::generate_session_token();
    tokens::store_session(
        &kv,
        &token,
        &SessionData {
            user_id: account.id.clone(),
        },
    )
    .await
    .expect("failed to store session");

    println!("user:  {} ({})", account.username, account.id);
    println!("admin: {}", account.is_staff);
    println!("token: {token}");
    ExitCode::SUCCESS
}
