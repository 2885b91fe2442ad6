//! JSON-encoded lists of names stored in text columns.
//!
//! `user_settings.favorites`, `channels.moderators` and
//! `channels.banned_users` each hold a JSON array of strings such as
//! `["alice","bob"]`. Existing rows depend on that exact encoding.

use crate::error::ApiError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameList(Vec<String>);

/// A single read-modify-write applied to a stored list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEdit {
    /// Append unconditionally; duplicates are kept.
    Append,
    /// Append only when absent.
    Insert,
    /// Remove the first equal entry.
    RemoveFirst,
}

impl NameList {
    /// Decode a stored column value. An empty value reads as an empty list.
    pub fn decode(raw: &str) -> Result<Self, ApiError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw).map(Self).map_err(|err| {
            tracing::error!(?err, raw, "corrupt encoded name list");
            ApiError::internal("corrupt list data")
        })
    }

    /// Parse user-submitted list text, returning `None` unless it is a JSON
    /// array of strings.
    pub fn parse_submitted(raw: &str) -> Option<Self> {
        serde_json::from_str(raw.trim()).ok().map(Self)
    }

    pub fn encode(&self) -> String {
        serde_json::Value::from(self.0.clone()).to_string()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    /// Append `name`, even when it is already present.
    pub fn push(&mut self, name: &str) {
        self.0.push(name.to_string());
    }

    /// Append `name` unless it is already present. Returns whether it was added.
    pub fn insert(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.push(name);
        true
    }

    /// Remove the first entry equal to `name`. Returns whether one was removed.
    pub fn remove_first(&mut self, name: &str) -> bool {
        match self.0.iter().position(|n| n == name) {
            Some(i) => {
                self.0.remove(i);
                true
            }
            None => false,
        }
    }

    /// Apply `edit` for `name`, returning whether the list changed.
    pub fn apply(&mut self, edit: ListEdit, name: &str) -> bool {
        match edit {
            ListEdit::Append => {
                self.push(name);
                true
            }
            ListEdit::Insert => self.insert(name),
            ListEdit::RemoveFirst => self.remove_first(name),
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_stored_arrays_and_blank_values() {
        let list = NameList::decode(r#"["alice", "bob"]"#).unwrap();
        assert_eq!(list.as_slice(), ["alice", "bob"]);
        assert_eq!(NameList::decode("").unwrap(), NameList::default());
        assert_eq!(NameList::decode("  ").unwrap(), NameList::default());
    }

    #[test]
    fn corrupt_values_are_internal_errors() {
        let err = NameList::decode("alice,bob").unwrap_err();
        assert_eq!(err.code, "INTERNAL_ERROR");
        assert!(NameList::decode(r#"[1, 2]"#).is_err());
    }

    #[test]
    fn encodes_as_compact_json_array() {
        let mut list = NameList::default();
        assert_eq!(list.encode(), "[]");
        list.push("alice");
        list.push("bob \"b\"");
        assert_eq!(list.encode(), r#"["alice","bob \"b\""]"#);
    }

    #[test]
    fn push_keeps_duplicates_but_insert_does_not() {
        let mut banned = NameList::default();
        banned.push("alice");
        banned.push("alice");
        assert_eq!(banned.encode(), r#"["alice","alice"]"#);

        let mut mods = NameList::default();
        assert!(mods.insert("alice"));
        assert!(!mods.insert("alice"));
        assert_eq!(mods.as_slice(), ["alice"]);
    }

    #[test]
    fn remove_first_matches_whole_names_only() {
        let mut list = NameList::decode(r#"["alice","al","alice"]"#).unwrap();
        assert!(list.remove_first("alice"));
        assert_eq!(list.as_slice(), ["al", "alice"]);

        assert!(!list.remove_first("ali"));
        assert!(list.remove_first("al"));
        assert_eq!(list.as_slice(), ["alice"]);
    }

    #[test]
    fn apply_reports_whether_anything_changed() {
        let mut list = NameList::default();
        assert!(list.apply(ListEdit::Append, "bob"));
        assert!(list.apply(ListEdit::Append, "bob"));
        assert!(!list.apply(ListEdit::Insert, "bob"));
        assert!(list.apply(ListEdit::RemoveFirst, "bob"));
        assert!(list.apply(ListEdit::RemoveFirst, "bob"));
        assert!(!list.apply(ListEdit::RemoveFirst, "bob"));
        assert!(list.as_slice().is_empty());
    }

    #[test]
    fn submitted_text_must_be_a_string_array() {
        assert!(NameList::parse_submitted(r#"["general"]"#).is_some());
        assert!(NameList::parse_submitted("[]").is_some());
        assert!(NameList::parse_submitted("general").is_none());
        assert!(NameList::parse_submitted(r#"{"a":1}"#).is_none());
        assert!(NameList::parse_submitted("").is_none());
    }
}
