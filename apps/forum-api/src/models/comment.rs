use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use scoped_futures::ScopedFutureExt;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::schema::{channels, comments, threads, users};
use crate::error::ApiError;
use crate::models::thread::Thread;

/// How long a comment counts as recent after it was posted.
pub const RECENT_WINDOW: Duration = Duration::hours(24);

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Comment {
    pub id: i64,
    pub parent_id: String,
    pub text: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = comments)]
pub struct NewComment<'a> {
    pub id: i64,
    pub parent_id: &'a str,
    pub text: &'a str,
    pub owner_id: &'a str,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommentView {
    pub id: i64,
    pub text: String,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub is_recent: bool,
}

impl Comment {
    pub fn is_recent(&self, now: DateTime<Utc>) -> bool {
        is_recent(self.created_at, now)
    }

    pub fn view(&self, owner: String, now: DateTime<Utc>) -> CommentView {
        CommentView {
            id: self.id,
            text: self.text.clone(),
            owner,
            created_at: self.created_at,
            is_recent: self.is_recent(now),
        }
    }
}

/// True when `created_at` lies strictly less than [`RECENT_WINDOW`] before `now`.
pub fn is_recent(created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - created_at < RECENT_WINDOW
}

pub async fn list_for_thread(
    conn: &mut AsyncPgConnection,
    thread: &Thread,
) -> Result<Vec<(Comment, String)>, ApiError> {
    let rows = comments::table
        .inner_join(users::table)
        .filter(comments::parent_id.eq(&thread.id))
        .order((comments::created_at.asc(), comments::id.asc()))
        .select((Comment::as_select(), users::username))
        .load(conn)
        .await?;
    Ok(rows)
}

/// Insert a validated comment and stamp `recent_date` on its thread and the
/// thread's channel, in one transaction.
pub async fn insert(
    conn: &mut AsyncPgConnection,
    id: i64,
    thread: &Thread,
    text: &str,
    owner_id: &str,
) -> Result<Comment, ApiError> {
    let thread_pk = thread.id.clone();
    let channel_id = thread.channel_id.clone();
    let text = text.to_string();
    let owner_id = owner_id.to_string();

    conn.transaction::<_, ApiError, _>(|conn| {
        async move {
            let now = Utc::now();

            let comment = diesel::insert_into(comments::table)
                .values(NewComment {
                    id,
                    parent_id: &thread_pk,
                    text: &text,
                    owner_id: &owner_id,
                    created_at: now,
                })
                .returning(Comment::as_returning())
                .get_result(conn)
                .await?;

            diesel::update(threads::table.find(&thread_pk))
                .set(threads::recent_date.eq(now))
                .execute(conn)
                .await?;

            diesel::update(channels::table.find(&channel_id))
                .set(channels::recent_date.eq(now))
                .execute(conn)
                .await?;

            Ok(comment)
        }
        .scope_boxed()
    })
    .await
}
