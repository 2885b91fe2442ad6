//! Form input and validation.
//!
//! Every field is optional at the deserialization layer so that missing or
//! malformed input reaches the validators here and turns into a queued
//! message, never a framework rejection.

use axum::extract::rejection::FormRejection;
use axum::Form;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::name_list::NameList;

pub const CHANNEL_NAME_MIN: usize = 4;
pub const CHANNEL_NAME_MAX: usize = 50;
pub const CHANNEL_DESCRIPTION_MIN: usize = 5;
pub const CHANNEL_DESCRIPTION_MAX: usize = 300;

pub const THREAD_NAME_MIN: usize = 5;
pub const THREAD_NAME_MAX: usize = 100;
pub const THREAD_DESCRIPTION_MIN: usize = 5;
pub const THREAD_DESCRIPTION_MAX: usize = 1000;

pub const COMMENT_TEXT_MIN: usize = 5;
pub const COMMENT_TEXT_MAX: usize = 5000;

pub const INVALID_INPUT: &str = "Invalid input.";

/// Unwrap a posted form body. A body that does not deserialize (a repeated
/// key, a missing content type) yields `None`, and the caller queues
/// [`INVALID_INPUT`].
pub fn accept<T>(body: Result<Form<T>, FormRejection>) -> Option<T> {
    match body {
        Ok(Form(form)) => Some(form),
        Err(rejection) => {
            tracing::debug!(%rejection, "unreadable form body");
            None
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn clean(field: &Option<String>) -> String {
    field.as_deref().unwrap_or_default().trim().to_string()
}

/// Channel names appear in URLs, so they are limited to a path-safe set.
fn is_path_safe(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

// ---------------------------------------------------------------------------
// Form descriptions handed to the presentation layer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FormSpec {
    /// Path the form posts to.
    pub action: String,
    /// Name of the submit field that selects the action.
    pub submit: String,
    pub fields: Vec<FieldSpec>,
}

/// A field must be strictly longer than `min_length` and at most `max_length`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FieldSpec {
    pub name: String,
    pub min_length: usize,
    pub max_length: usize,
}

impl FormSpec {
    pub fn channel(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            submit: "create".into(),
            fields: vec![
                FieldSpec {
                    name: "channel_name".into(),
                    min_length: CHANNEL_NAME_MIN,
                    max_length: CHANNEL_NAME_MAX,
                },
                FieldSpec {
                    name: "description".into(),
                    min_length: CHANNEL_DESCRIPTION_MIN,
                    max_length: CHANNEL_DESCRIPTION_MAX,
                },
            ],
        }
    }

    pub fn thread(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            submit: "create".into(),
            fields: vec![
                FieldSpec {
                    name: "thread_name".into(),
                    min_length: THREAD_NAME_MIN,
                    max_length: THREAD_NAME_MAX,
                },
                FieldSpec {
                    name: "description".into(),
                    min_length: THREAD_DESCRIPTION_MIN,
                    max_length: THREAD_DESCRIPTION_MAX,
                },
            ],
        }
    }

    pub fn comment(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            submit: "create".into(),
            fields: vec![FieldSpec {
                name: "text".into(),
                min_length: COMMENT_TEXT_MIN,
                max_length: COMMENT_TEXT_MAX,
            }],
        }
    }

    pub fn settings(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            submit: "save".into(),
            fields: vec![FieldSpec {
                name: "favorites".into(),
                min_length: 0,
                max_length: usize::MAX,
            }],
        }
    }
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// Everything the channel list page can post.
#[derive(Debug, Default, Deserialize)]
pub struct ChannelPageForm {
    pub favorite: Option<String>,
    pub unfavorite: Option<String>,
    pub channel_name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ChannelAction {
    Favorite(String),
    Unfavorite(String),
    Create(ChannelInput),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInput {
    pub channel_name: String,
    pub description: String,
}

impl ChannelPageForm {
    /// Favorite toggles take precedence; anything else is a create.
    pub fn action(self) -> ChannelAction {
        if let Some(name) = self.favorite {
            return ChannelAction::Favorite(name.trim().to_string());
        }
        if let Some(name) = self.unfavorite {
            return ChannelAction::Unfavorite(name.trim().to_string());
        }
        ChannelAction::Create(ChannelInput {
            channel_name: clean(&self.channel_name),
            description: clean(&self.description),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRejection {
    AlreadyExists,
    NameTooShort,
    DescriptionTooShort,
    Invalid,
}

impl ChannelRejection {
    pub fn message(self) -> &'static str {
        match self {
            Self::AlreadyExists => "Channel already exists with that name.",
            Self::NameTooShort => "Channel name must be at least 4 characters.",
            Self::DescriptionTooShort => "Channel description must be at least 5 characters.",
            Self::Invalid => INVALID_INPUT,
        }
    }
}

/// Business checks run first, in order; structural checks last.
pub fn validate_channel(input: &ChannelInput, exists: bool) -> Result<(), ChannelRejection> {
    let name_len = char_len(&input.channel_name);
    let description_len = char_len(&input.description);

    if exists {
        return Err(ChannelRejection::AlreadyExists);
    }
    if name_len <= CHANNEL_NAME_MIN {
        return Err(ChannelRejection::NameTooShort);
    }
    if description_len <= CHANNEL_DESCRIPTION_MIN {
        return Err(ChannelRejection::DescriptionTooShort);
    }
    if name_len > CHANNEL_NAME_MAX
        || !is_path_safe(&input.channel_name)
        || description_len > CHANNEL_DESCRIPTION_MAX
    {
        return Err(ChannelRejection::Invalid);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Thread
// ---------------------------------------------------------------------------

/// Everything the thread list page can post.
#[derive(Debug, Default, Deserialize)]
pub struct ThreadPageForm {
    pub create: Option<String>,
    pub delete: Option<String>,
    pub back: Option<String>,
    pub thread_name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadInput {
    pub thread_name: String,
    pub description: String,
}

/// Actions shared by the thread and comment pages.
#[derive(Debug, PartialEq, Eq)]
pub enum PageAction<T> {
    Create(T),
    Delete,
    Back,
    Unknown,
}

impl ThreadPageForm {
    pub fn action(self) -> PageAction<ThreadInput> {
        if self.create.is_some() {
            PageAction::Create(ThreadInput {
                thread_name: clean(&self.thread_name),
                description: clean(&self.description),
            })
        } else if self.delete.is_some() {
            PageAction::Delete
        } else if self.back.is_some() {
            PageAction::Back
        } else {
            PageAction::Unknown
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadRejection {
    AlreadyExists,
    NameTooShort,
    DescriptionTooShort,
    Invalid,
}

impl ThreadRejection {
    pub fn message(self) -> &'static str {
        match self {
            Self::AlreadyExists => "Thread already exists with that name.",
            Self::NameTooShort => "Thread name must be at least 5 characters.",
            Self::DescriptionTooShort => "Thread description must be at least 5 characters.",
            Self::Invalid => INVALID_INPUT,
        }
    }
}

pub fn validate_thread(input: &ThreadInput, exists: bool) -> Result<(), ThreadRejection> {
    let name_len = char_len(&input.thread_name);
    let description_len = char_len(&input.description);

    if exists {
        return Err(ThreadRejection::AlreadyExists);
    }
    if name_len <= THREAD_NAME_MIN {
        return Err(ThreadRejection::NameTooShort);
    }
    if description_len <= THREAD_DESCRIPTION_MIN {
        return Err(ThreadRejection::DescriptionTooShort);
    }
    if name_len > THREAD_NAME_MAX || description_len > THREAD_DESCRIPTION_MAX {
        return Err(ThreadRejection::Invalid);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct CommentPageForm {
    pub create: Option<String>,
    pub delete: Option<String>,
    pub back: Option<String>,
    pub text: Option<String>,
}

impl CommentPageForm {
    pub fn action(self) -> PageAction<String> {
        if self.create.is_some() {
            PageAction::Create(clean(&self.text))
        } else if self.delete.is_some() {
            PageAction::Delete
        } else if self.back.is_some() {
            PageAction::Back
        } else {
            PageAction::Unknown
        }
    }
}

/// Comments have no uniqueness rule, so every failure is the generic one.
pub fn validate_comment(text: &str) -> Result<(), &'static str> {
    let len = char_len(text);
    if len <= COMMENT_TEXT_MIN || len > COMMENT_TEXT_MAX {
        return Err(INVALID_INPUT);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Favorites
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct FavoriteForm {
    pub favorite: Option<String>,
    pub unfavorite: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoriteToggle {
    Add(String),
    Remove(String),
}

impl FavoriteForm {
    pub fn toggle(self) -> Option<FavoriteToggle> {
        match (self.favorite, self.unfavorite) {
            (Some(name), _) => Some(FavoriteToggle::Add(name.trim().to_string())),
            (None, Some(name)) => Some(FavoriteToggle::Remove(name.trim().to_string())),
            (None, None) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct SettingsForm {
    pub save: Option<String>,
    pub favorites: Option<String>,
}

/// Fields bound onto the stored settings row. `None` leaves a field as is.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SettingsChanges {
    pub favorites: Option<NameList>,
}

impl SettingsForm {
    pub fn validate(&self) -> Result<SettingsChanges, &'static str> {
        if self.save.is_none() {
            return Err(INVALID_INPUT);
        }
        let favorites = match self.favorites.as_deref() {
            Some(raw) => Some(NameList::parse_submitted(raw).ok_or(INVALID_INPUT)?),
            None => None,
        };
        Ok(SettingsChanges { favorites })
    }
}

// ---------------------------------------------------------------------------
// Moderation
// ---------------------------------------------------------------------------

/// Everything the user page can post. Channel-scoped actions carry the
/// channel name as their value.
#[derive(Debug, Default, Deserialize)]
pub struct ModerationForm {
    pub admin_ban: Option<String>,
    pub admin_unban: Option<String>,
    pub owner_ban: Option<String>,
    pub moderator_ban: Option<String>,
    pub owner_unban: Option<String>,
    pub moderator_unban: Option<String>,
    pub add_moderator: Option<String>,
    pub remove_moderator: Option<String>,
}

/// Who may perform a channel-scoped action besides admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Owner,
    Moderator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationAction {
    AdminBan,
    AdminUnban,
    Ban { channel: String, role: Role },
    Unban { channel: String, role: Role },
    AddModerator { channel: String },
    RemoveModerator { channel: String },
}

impl ModerationForm {
    /// Every present field, in dispatch order.
    pub fn actions(self) -> Vec<ModerationAction> {
        let channel = |v: String| v.trim().to_string();
        let mut actions = Vec::new();

        if self.admin_ban.is_some() {
            actions.push(ModerationAction::AdminBan);
        }
        if self.admin_unban.is_some() {
            actions.push(ModerationAction::AdminUnban);
        }
        if let Some(v) = self.owner_ban {
            actions.push(ModerationAction::Ban {
                channel: channel(v),
                role: Role::Owner,
            });
        }
        if let Some(v) = self.moderator_ban {
            actions.push(ModerationAction::Ban {
                channel: channel(v),
                role: Role::Moderator,
            });
        }
        if let Some(v) = self.owner_unban {
            actions.push(ModerationAction::Unban {
                channel: channel(v),
                role: Role::Owner,
            });
        }
        if let Some(v) = self.moderator_unban {
            actions.push(ModerationAction::Unban {
                channel: channel(v),
                role: Role::Moderator,
            });
        }
        if let Some(v) = self.add_moderator {
            actions.push(ModerationAction::AddModerator { channel: channel(v) });
        }
        if let Some(v) = self.remove_moderator {
            actions.push(ModerationAction::RemoveModerator { channel: channel(v) });
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(name: &str, description: &str) -> ChannelInput {
        ChannelInput {
            channel_name: name.into(),
            description: description.into(),
        }
    }

    #[test]
    fn channel_checks_run_in_order() {
        assert_eq!(
            validate_channel(&channel("abc", "x"), true),
            Err(ChannelRejection::AlreadyExists)
        );
        assert_eq!(
            validate_channel(&channel("abc", "x"), false),
            Err(ChannelRejection::NameTooShort)
        );
        assert_eq!(
            validate_channel(&channel("general", "hello"), false),
            Err(ChannelRejection::DescriptionTooShort)
        );
        assert_eq!(
            validate_channel(&channel("has space", "hello!"), false),
            Err(ChannelRejection::Invalid)
        );
        assert_eq!(validate_channel(&channel("general", "hello!"), false), Ok(()));
    }

    #[test]
    fn channel_name_threshold_is_strict() {
        assert_eq!(
            validate_channel(&channel("abcd", "hello!"), false),
            Err(ChannelRejection::NameTooShort)
        );
        assert_eq!(validate_channel(&channel("abcde", "hello!"), false), Ok(()));
        assert_eq!(
            ChannelRejection::NameTooShort.message(),
            "Channel name must be at least 4 characters."
        );
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        // Five two-byte characters.
        assert_eq!(validate_comment("ééééé"), Err(INVALID_INPUT));
        assert_eq!(validate_comment("éééééé"), Ok(()));
    }

    #[test]
    fn oversized_fields_are_generic_failures() {
        let long_name = "a".repeat(CHANNEL_NAME_MAX + 1);
        assert_eq!(
            validate_channel(&channel(&long_name, "hello!"), false),
            Err(ChannelRejection::Invalid)
        );

        let thread = ThreadInput {
            thread_name: "x".repeat(THREAD_NAME_MAX + 1),
            description: "a fine description".into(),
        };
        assert_eq!(validate_thread(&thread, false), Err(ThreadRejection::Invalid));
        assert_eq!(validate_comment(&"x".repeat(COMMENT_TEXT_MAX + 1)), Err(INVALID_INPUT));
    }

    #[test]
    fn thread_checks_run_in_order() {
        let short = ThreadInput {
            thread_name: "hello".into(),
            description: "tiny".into(),
        };
        assert_eq!(validate_thread(&short, true), Err(ThreadRejection::AlreadyExists));
        assert_eq!(validate_thread(&short, false), Err(ThreadRejection::NameTooShort));

        let no_description = ThreadInput {
            thread_name: "hello!".into(),
            description: "tiny".into(),
        };
        assert_eq!(
            validate_thread(&no_description, false),
            Err(ThreadRejection::DescriptionTooShort)
        );
    }

    #[test]
    fn channel_form_dispatch_prefers_favorite_toggles() {
        let form = ChannelPageForm {
            favorite: Some(" general ".into()),
            channel_name: Some("other".into()),
            ..Default::default()
        };
        assert_eq!(form.action(), ChannelAction::Favorite("general".into()));

        let form = ChannelPageForm {
            channel_name: Some("  general ".into()),
            ..Default::default()
        };
        assert_eq!(
            form.action(),
            ChannelAction::Create(channel("general", ""))
        );
    }

    #[test]
    fn page_forms_pick_the_submitted_action() {
        let form = ThreadPageForm {
            delete: Some("".into()),
            ..Default::default()
        };
        assert_eq!(form.action(), PageAction::Delete);

        let form = CommentPageForm {
            create: Some("".into()),
            text: Some("  first post  ".into()),
            ..Default::default()
        };
        assert_eq!(form.action(), PageAction::Create("first post".into()));

        assert_eq!(CommentPageForm::default().action(), PageAction::Unknown);
    }

    #[test]
    fn settings_favorites_must_be_a_string_array() {
        let form = SettingsForm {
            save: Some("".into()),
            favorites: Some(r#"["general"]"#.into()),
        };
        let changes = form.validate().unwrap();
        assert_eq!(changes.favorites.unwrap().as_slice(), ["general"]);

        let form = SettingsForm {
            save: Some("".into()),
            favorites: Some("general".into()),
        };
        assert_eq!(form.validate(), Err(INVALID_INPUT));

        let form = SettingsForm {
            save: Some("".into()),
            favorites: None,
        };
        assert_eq!(form.validate(), Ok(SettingsChanges::default()));
    }

    #[test]
    fn moderation_actions_are_collected_in_order() {
        let form = ModerationForm {
            owner_unban: Some("general".into()),
            admin_ban: Some("".into()),
            moderator_ban: Some(" random ".into()),
            ..Default::default()
        };
        assert_eq!(
            form.actions(),
            vec![
                ModerationAction::AdminBan,
                ModerationAction::Ban {
                    channel: "random".into(),
                    role: Role::Moderator
                },
                ModerationAction::Unban {
                    channel: "general".into(),
                    role: Role::Owner
                },
            ]
        );
    }
}
