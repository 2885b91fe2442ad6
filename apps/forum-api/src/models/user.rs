use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::OptionalExtension;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Serialize;
use utoipa::ToSchema;

use forum_common::id::{prefix, PrefixedId};

use crate::db::schema::{channels, users};
use crate::error::ApiError;

/// A forum account. Rows are created by the external auth service; this
/// service only flips `is_active` when an admin bans or unbans.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, ToSchema)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: String,
    pub username: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
}

impl PrefixedId for User {
    const PREFIX: &'static str = prefix::USER;
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub id: &'a str,
    pub username: &'a str,
    pub is_staff: bool,
}

/// Public profile shown on `/user/{username}/`.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserProfile {
    pub username: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub date_joined: DateTime<Utc>,
    pub owned_channels: Vec<String>,
}

pub async fn find_by_id(
    conn: &mut AsyncPgConnection,
    user_id: &str,
) -> Result<Option<User>, ApiError> {
    let user = users::table
        .find(user_id)
        .select(User::as_select())
        .first(conn)
        .await
        .optional()?;
    Ok(user)
}

pub async fn find_by_username(
    conn: &mut AsyncPgConnection,
    username: &str,
) -> Result<Option<User>, ApiError> {
    let user = users::table
        .filter(users::username.eq(username))
        .select(User::as_select())
        .first(conn)
        .await
        .optional()?;
    Ok(user)
}

pub async fn load_profile(
    conn: &mut AsyncPgConnection,
    user: User,
) -> Result<UserProfile, ApiError> {
    let owned_channels: Vec<String> = channels::table
        .filter(channels::owner_id.eq(&user.id))
        .order(channels::created_at.asc())
        .select(channels::channel_name)
        .load(conn)
        .await?;

    Ok(UserProfile {
        username: user.username,
        is_active: user.is_active,
        is_admin: user.is_staff,
        date_joined: user.date_joined,
        owned_channels,
    })
}

/// Set the account's active flag. Idempotent.
pub async fn set_active(
    conn: &mut AsyncPgConnection,
    user_id: &str,
    active: bool,
) -> Result<(), ApiError> {
    diesel::update(users::table.find(user_id))
        .set(users::is_active.eq(active))
        .execute(conn)
        .await?;
    Ok(())
}

/// Create the user if the username is new, otherwise return the existing row
/// with its admin flag updated.
pub async fn upsert_by_username(
    conn: &mut AsyncPgConnection,
    username: &str,
    is_staff: bool,
) -> Result<User, ApiError> {
    let id = User::generate();

    let user = diesel::insert_into(users::table)
        .values(NewUser {
            id: &id,
            username,
            is_staff,
        })
        .on_conflict(users::username)
        .do_update()
        .set(users::is_staff.eq(is_staff))
        .returning(User::as_returning())
        .get_result(conn)
        .await?;

    Ok(user)
}
