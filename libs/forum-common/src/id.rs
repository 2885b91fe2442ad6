use ulid::Ulid;

/// Generates a new ULID-based ID with the given prefix.
///
/// # Examples
/// ```
/// let id = forum_common::id::prefixed_ulid("usr");
/// assert!(id.starts_with("usr_"));
/// ```
pub fn prefixed_ulid(prefix: &str) -> String {
    format!("{}_{}", prefix, Ulid::new())
}

/// Marker trait for row types keyed by a prefixed ID.
pub trait PrefixedId {
    const PREFIX: &'static str;

    fn generate() -> String {
        prefixed_ulid(Self::PREFIX)
    }
}

/// Well-known ID prefixes.
pub mod prefix {
    pub const USER: &str = "usr";
    pub const CHANNEL: &str = "ch";
    pub const THREAD: &str = "thr";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_ulid_has_prefix_and_ulid_body() {
        let id = prefixed_ulid(prefix::THREAD);
        assert!(id.starts_with("thr_"));
        // ULID is 26 chars, plus prefix + underscore
        assert_eq!(id.len(), 3 + 1 + 26);
    }

    #[test]
    fn generated_ids_differ() {
        struct Channel;
        impl PrefixedId for Channel {
            const PREFIX: &'static str = prefix::CHANNEL;
        }
        assert_ne!(Channel::generate(), Channel::generate());
    }
}
