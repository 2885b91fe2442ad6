use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::OptionalExtension;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use scoped_futures::ScopedFutureExt;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::schema::user_settings;
use crate::error::ApiError;
use crate::models::name_list::{ListEdit, NameList};

/// Row from the `user_settings` table.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = user_settings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserSettings {
    pub user_id: String,
    pub favorites: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = user_settings)]
struct NewUserSettings<'a> {
    user_id: &'a str,
}

/// Settings as handed to the presentation layer.
#[derive(Debug, Serialize, ToSchema)]
pub struct SettingsView {
    pub favorites: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl UserSettings {
    pub fn favorites(&self) -> Result<NameList, ApiError> {
        NameList::decode(&self.favorites)
    }

    pub fn view(&self) -> Result<SettingsView, ApiError> {
        Ok(SettingsView {
            favorites: self.favorites()?.into_vec(),
            updated_at: self.updated_at,
        })
    }
}

/// The user's favorites, or an empty list when no settings row exists yet.
pub async fn favorites_of(
    conn: &mut AsyncPgConnection,
    user_id: &str,
) -> Result<NameList, ApiError> {
    let raw: Option<String> = user_settings::table
        .find(user_id)
        .select(user_settings::favorites)
        .first(conn)
        .await
        .optional()?;

    match raw {
        Some(raw) => NameList::decode(&raw),
        None => Ok(NameList::default()),
    }
}

/// Fetch the user's settings row, creating it on first access.
pub async fn get_or_create(
    conn: &mut AsyncPgConnection,
    user_id: &str,
) -> Result<UserSettings, ApiError> {
    diesel::insert_into(user_settings::table)
        .values(NewUserSettings { user_id })
        .on_conflict_do_nothing()
        .execute(conn)
        .await?;

    let settings = user_settings::table
        .find(user_id)
        .select(UserSettings::as_select())
        .first(conn)
        .await?;

    Ok(settings)
}

/// Apply one edit to the favorites list under a row lock. Returns whether
/// the stored list changed.
pub async fn edit_favorites(
    conn: &mut AsyncPgConnection,
    user_id: &str,
    edit: ListEdit,
    channel_name: &str,
) -> Result<bool, ApiError> {
    let user_id = user_id.to_string();
    let channel_name = channel_name.to_string();

    conn.transaction::<_, ApiError, _>(|conn| {
        async move {
            diesel::insert_into(user_settings::table)
                .values(NewUserSettings { user_id: &user_id })
                .on_conflict_do_nothing()
                .execute(conn)
                .await?;

            let raw: String = user_settings::table
                .find(&user_id)
                .select(user_settings::favorites)
                .for_update()
                .first(conn)
                .await?;

            let mut favorites = NameList::decode(&raw)?;
            if !favorites.apply(edit, &channel_name) {
                return Ok(false);
            }

            diesel::update(user_settings::table.find(&user_id))
                .set((
                    user_settings::favorites.eq(favorites.encode()),
                    user_settings::updated_at.eq(Utc::now()),
                ))
                .execute(conn)
                .await?;

            Ok(true)
        }
        .scope_boxed()
    })
    .await
}

/// Overwrite the favorites list of an existing settings row.
pub async fn save_favorites(
    conn: &mut AsyncPgConnection,
    user_id: &str,
    favorites: &NameList,
) -> Result<(), ApiError> {
    diesel::update(user_settings::table.find(user_id))
        .set((
            user_settings::favorites.eq(favorites.encode()),
            user_settings::updated_at.eq(Utc::now()),
        ))
        .execute(conn)
        .await?;
    Ok(())
}
