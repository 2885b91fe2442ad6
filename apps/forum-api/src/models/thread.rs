use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::OptionalExtension;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use forum_common::id::{prefix, PrefixedId};
use scoped_futures::ScopedFutureExt;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::schema::{channels, threads, users};
use crate::error::ApiError;
use crate::models::channel::Channel;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = threads)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Thread {
    pub id: String,
    pub channel_id: String,
    /// Sequence number scoped to the channel, starting at 1.
    pub thread_id: i32,
    pub thread_name: String,
    pub description: String,
    pub owner_id: String,
    pub recent_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl PrefixedId for Thread {
    const PREFIX: &'static str = prefix::THREAD;
}

#[derive(Debug, Insertable)]
#[diesel(table_name = threads)]
pub struct NewThread<'a> {
    pub id: &'a str,
    pub channel_id: &'a str,
    pub thread_id: i32,
    pub thread_name: &'a str,
    pub description: &'a str,
    pub owner_id: &'a str,
    pub recent_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ThreadView {
    pub thread_id: i32,
    pub thread_name: String,
    pub description: String,
    pub owner: String,
    pub recent_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Thread {
    pub fn view(&self, owner: String) -> ThreadView {
        ThreadView {
            thread_id: self.thread_id,
            thread_name: self.thread_name.clone(),
            description: self.description.clone(),
            owner,
            recent_date: self.recent_date,
            created_at: self.created_at,
        }
    }
}

/// Resolve `(channel name, thread id)` to the thread and its channel.
pub async fn find(
    conn: &mut AsyncPgConnection,
    channel_name: &str,
    thread_id: i32,
) -> Result<Option<(Thread, Channel)>, ApiError> {
    let row = threads::table
        .inner_join(channels::table)
        .filter(channels::channel_name.eq(channel_name))
        .filter(threads::thread_id.eq(thread_id))
        .select((Thread::as_select(), Channel::as_select()))
        .first(conn)
        .await
        .optional()?;
    Ok(row)
}

/// Like [`find`], but 404 when the thread does not resolve.
pub async fn get(
    conn: &mut AsyncPgConnection,
    channel_name: &str,
    thread_id: i32,
) -> Result<(Thread, Channel), ApiError> {
    find(conn, channel_name, thread_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Thread not found"))
}

pub async fn list_for_channel(
    conn: &mut AsyncPgConnection,
    channel_id: &str,
) -> Result<Vec<(Thread, String)>, ApiError> {
    let rows = threads::table
        .inner_join(users::table)
        .filter(threads::channel_id.eq(channel_id))
        .order(threads::thread_id.asc())
        .select((Thread::as_select(), users::username))
        .load(conn)
        .await?;
    Ok(rows)
}

pub async fn owner_username(
    conn: &mut AsyncPgConnection,
    thread: &Thread,
) -> Result<String, ApiError> {
    let username = users::table
        .find(&thread.owner_id)
        .select(users::username)
        .first(conn)
        .await?;
    Ok(username)
}

pub async fn name_exists(
    conn: &mut AsyncPgConnection,
    channel_id: &str,
    thread_name: &str,
) -> Result<bool, ApiError> {
    let count: i64 = threads::table
        .filter(threads::channel_id.eq(channel_id))
        .filter(threads::thread_name.eq(thread_name))
        .count()
        .get_result(conn)
        .await?;
    Ok(count > 0)
}

/// Insert a validated thread and stamp the channel's recent date, in one
/// transaction. The channel row stays locked while the next per-channel
/// `thread_id` is allocated.
pub async fn insert(
    conn: &mut AsyncPgConnection,
    channel_id: &str,
    thread_name: &str,
    description: &str,
    owner_id: &str,
) -> Result<Thread, diesel::result::Error> {
    let channel_id = channel_id.to_string();
    let thread_name = thread_name.to_string();
    let description = description.to_string();
    let owner_id = owner_id.to_string();

    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        async move {
            channels::table
                .find(&channel_id)
                .select(channels::id)
                .for_update()
                .first::<String>(conn)
                .await?;

            let last: Option<i32> = threads::table
                .filter(threads::channel_id.eq(&channel_id))
                .select(diesel::dsl::max(threads::thread_id))
                .get_result(conn)
                .await?;

            let id = Thread::generate();
            let now = Utc::now();

            let thread = diesel::insert_into(threads::table)
                .values(NewThread {
                    id: &id,
                    channel_id: &channel_id,
                    thread_id: last.unwrap_or(0) + 1,
                    thread_name: &thread_name,
                    description: &description,
                    owner_id: &owner_id,
                    recent_date: now,
                    created_at: now,
                })
                .returning(Thread::as_returning())
                .get_result(conn)
                .await?;

            diesel::update(channels::table.find(&channel_id))
                .set(channels::recent_date.eq(now))
                .execute(conn)
                .await?;

            Ok(thread)
        }
        .scope_boxed()
    })
    .await
}

/// Delete a thread; its comments go with it through `ON DELETE CASCADE`.
pub async fn delete(conn: &mut AsyncPgConnection, thread: &Thread) -> Result<(), ApiError> {
    diesel::delete(threads::table.find(&thread.id))
        .execute(conn)
        .await?;
    Ok(())
}
