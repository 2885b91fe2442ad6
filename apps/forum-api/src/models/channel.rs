use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::OptionalExtension;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use forum_common::id::{prefix, PrefixedId};
use scoped_futures::ScopedFutureExt;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::schema::{channels, users};
use crate::error::ApiError;
use crate::models::name_list::{ListEdit, NameList};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = channels)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Channel {
    pub id: String,
    pub channel_name: String,
    pub description: String,
    pub owner_id: String,
    pub recent_date: DateTime<Utc>,
    pub moderators: String,
    pub banned_users: String,
    pub created_at: DateTime<Utc>,
}

impl PrefixedId for Channel {
    const PREFIX: &'static str = prefix::CHANNEL;
}

#[derive(Debug, Insertable)]
#[diesel(table_name = channels)]
pub struct NewChannel<'a> {
    pub id: &'a str,
    pub channel_name: &'a str,
    pub description: &'a str,
    pub owner_id: &'a str,
    pub recent_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Channel as handed to the presentation layer.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChannelView {
    pub channel_name: String,
    pub description: String,
    pub owner: String,
    pub recent_date: DateTime<Utc>,
    pub moderators: Vec<String>,
    pub banned_users: Vec<String>,
    /// Whether the viewer has this channel in their favorites.
    pub favorite: bool,
}

/// Which encoded list column of a channel to edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelList {
    Moderators,
    BannedUsers,
}

impl Channel {
    pub fn moderator_list(&self) -> Result<NameList, ApiError> {
        NameList::decode(&self.moderators)
    }

    pub fn banned_list(&self) -> Result<NameList, ApiError> {
        NameList::decode(&self.banned_users)
    }

    pub fn is_banned(&self, username: &str) -> Result<bool, ApiError> {
        Ok(self.banned_list()?.contains(username))
    }

    pub fn view(&self, owner: String, favorites: &NameList) -> Result<ChannelView, ApiError> {
        Ok(ChannelView {
            channel_name: self.channel_name.clone(),
            description: self.description.clone(),
            owner,
            recent_date: self.recent_date,
            moderators: self.moderator_list()?.into_vec(),
            banned_users: self.banned_list()?.into_vec(),
            favorite: favorites.contains(&self.channel_name),
        })
    }
}

pub async fn find_by_name(
    conn: &mut AsyncPgConnection,
    channel_name: &str,
) -> Result<Option<Channel>, ApiError> {
    let channel = channels::table
        .filter(channels::channel_name.eq(channel_name))
        .select(Channel::as_select())
        .first(conn)
        .await
        .optional()?;
    Ok(channel)
}

/// Resolve a channel by name, 404 if it does not exist.
pub async fn get_by_name(
    conn: &mut AsyncPgConnection,
    channel_name: &str,
) -> Result<Channel, ApiError> {
    find_by_name(conn, channel_name)
        .await?
        .ok_or_else(|| ApiError::not_found("Channel not found"))
}

pub async fn name_exists(
    conn: &mut AsyncPgConnection,
    channel_name: &str,
) -> Result<bool, ApiError> {
    let count: i64 = channels::table
        .filter(channels::channel_name.eq(channel_name))
        .count()
        .get_result(conn)
        .await?;
    Ok(count > 0)
}

/// All channels in creation order, paired with their owner's username.
pub async fn list_with_owners(
    conn: &mut AsyncPgConnection,
) -> Result<Vec<(Channel, String)>, ApiError> {
    let rows = channels::table
        .inner_join(users::table)
        .order(channels::created_at.asc())
        .select((Channel::as_select(), users::username))
        .load(conn)
        .await?;
    Ok(rows)
}

/// Channels whose names appear in `names`, in creation order.
pub async fn list_named(
    conn: &mut AsyncPgConnection,
    names: &[String],
) -> Result<Vec<(Channel, String)>, ApiError> {
    if names.is_empty() {
        return Ok(Vec::new());
    }
    let rows = channels::table
        .inner_join(users::table)
        .filter(channels::channel_name.eq_any(names))
        .order(channels::created_at.asc())
        .select((Channel::as_select(), users::username))
        .load(conn)
        .await?;
    Ok(rows)
}

pub async fn owner_username(
    conn: &mut AsyncPgConnection,
    channel: &Channel,
) -> Result<String, ApiError> {
    let username = users::table
        .find(&channel.owner_id)
        .select(users::username)
        .first(conn)
        .await?;
    Ok(username)
}

/// Insert a validated channel. A unique-key violation on the name surfaces as
/// the raw diesel error so the caller can report "already exists".
pub async fn insert(
    conn: &mut AsyncPgConnection,
    channel_name: &str,
    description: &str,
    owner_id: &str,
) -> Result<Channel, diesel::result::Error> {
    let id = Channel::generate();
    let now = Utc::now();

    diesel::insert_into(channels::table)
        .values(NewChannel {
            id: &id,
            channel_name,
            description,
            owner_id,
            recent_date: now,
            created_at: now,
        })
        .returning(Channel::as_returning())
        .get_result(conn)
        .await
}

/// Delete a channel by name. Threads and comments go with it through
/// `ON DELETE CASCADE`. Returns the number of deleted channels.
pub async fn delete_by_name(
    conn: &mut AsyncPgConnection,
    channel_name: &str,
) -> Result<usize, ApiError> {
    let deleted = diesel::delete(channels::table.filter(channels::channel_name.eq(channel_name)))
        .execute(conn)
        .await?;
    Ok(deleted)
}

/// Apply one edit to a channel's moderators or banned users under a row
/// lock. Returns whether the stored list changed.
pub async fn edit_list(
    conn: &mut AsyncPgConnection,
    channel_id: &str,
    list: ChannelList,
    edit: ListEdit,
    username: &str,
) -> Result<bool, ApiError> {
    let channel_id = channel_id.to_string();
    let username = username.to_string();

    conn.transaction::<_, ApiError, _>(|conn| {
        async move {
            let (moderators, banned_users): (String, String) = channels::table
                .find(&channel_id)
                .select((channels::moderators, channels::banned_users))
                .for_update()
                .first(conn)
                .await?;

            let raw = match list {
                ChannelList::Moderators => moderators,
                ChannelList::BannedUsers => banned_users,
            };
            let mut names = NameList::decode(&raw)?;
            if !names.apply(edit, &username) {
                return Ok(false);
            }

            let target = channels::table.find(&channel_id);
            match list {
                ChannelList::Moderators => {
                    diesel::update(target)
                        .set(channels::moderators.eq(names.encode()))
                        .execute(conn)
                        .await?
                }
                ChannelList::BannedUsers => {
                    diesel::update(target)
                        .set(channels::banned_users.eq(names.encode()))
                        .execute(conn)
                        .await?
                }
            };

            Ok(true)
        }
        .scope_boxed()
    })
    .await
}
