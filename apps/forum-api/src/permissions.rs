//! Privilege tiers: admins are global, owners and moderators are per channel.

use crate::auth::middleware::AuthUser;
use crate::error::ApiError;
use crate::forms::Role;
use crate::models::channel::Channel;

pub fn is_owner(user: &AuthUser, channel: &Channel) -> bool {
    user.user_id == channel.owner_id
}

/// The channel owner counts as a moderator.
pub fn is_moderator(user: &AuthUser, channel: &Channel) -> Result<bool, ApiError> {
    if is_owner(user, channel) {
        return Ok(true);
    }
    Ok(channel.moderator_list()?.contains(&user.username))
}

/// Whether `user` may perform an action reserved for `role` on `channel`.
/// Admins may do everything.
pub fn may_act(user: &AuthUser, channel: &Channel, role: Role) -> Result<bool, ApiError> {
    if user.is_admin {
        return Ok(true);
    }
    match role {
        Role::Owner => Ok(is_owner(user, channel)),
        Role::Moderator => is_moderator(user, channel),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn channel(owner_id: &str, moderators: &str) -> Channel {
        Channel {
            id: "ch_1".into(),
            channel_name: "general".into(),
            description: "hello!".into(),
            owner_id: owner_id.into(),
            recent_date: Utc::now(),
            moderators: moderators.into(),
            banned_users: "[]".into(),
            created_at: Utc::now(),
        }
    }

    fn user(id: &str, username: &str, is_admin: bool) -> AuthUser {
        AuthUser {
            user_id: id.into(),
            username: username.into(),
            is_admin,
        }
    }

    #[test]
    fn owners_moderate_their_own_channel() {
        let ch = channel("usr_owner", "[]");
        let owner = user("usr_owner", "olivia", false);
        assert!(may_act(&owner, &ch, Role::Owner).unwrap());
        assert!(may_act(&owner, &ch, Role::Moderator).unwrap());
    }

    #[test]
    fn moderators_cannot_use_owner_actions() {
        let ch = channel("usr_owner", r#"["mallory"]"#);
        let moderator = user("usr_mod", "mallory", false);
        assert!(may_act(&moderator, &ch, Role::Moderator).unwrap());
        assert!(!may_act(&moderator, &ch, Role::Owner).unwrap());
    }

    #[test]
    fn admins_may_act_anywhere() {
        let ch = channel("usr_owner", "[]");
        let admin = user("usr_admin", "root", true);
        assert!(may_act(&admin, &ch, Role::Owner).unwrap());
        assert!(!is_moderator(&admin, &ch).unwrap());
    }

    #[test]
    fn strangers_may_not_act() {
        let ch = channel("usr_owner", r#"["mallory"]"#);
        let stranger = user("usr_x", "mal", false);
        assert!(!may_act(&stranger, &ch, Role::Moderator).unwrap());
    }
}
