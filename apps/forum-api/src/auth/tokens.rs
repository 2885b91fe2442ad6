//! Session tokens shared with the external auth service.
//!
//! The auth service writes `forum:session:<token>` → `{"user_id": "usr_…"}`
//! into the session store; this service only reads them (and the dev
//! `issue-session` tool writes them).

use serde::{Deserialize, Serialize};

use crate::db::kv::KeyValueStore;
use crate::error::ApiError;

/// Session TTL in seconds (14 days).
pub const SESSION_TTL_SECS: u64 = 14 * 24 * 3600;

/// Data stored alongside a session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: String,
}

/// Generate an opaque random token with the given prefix.
pub fn generate_opaque_token(prefix: &str, bytes: usize) -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use rand::Rng;
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill(&mut buf[..]);
    format!("{}_{}", prefix, URL_SAFE_NO_PAD.encode(&buf))
}

pub fn generate_session_token() -> String {
    generate_opaque_token("fst", 32)
}

fn session_key(token: &str) -> String {
    format!("forum:session:{token}")
}

pub async fn store_session(
    kv: &dyn KeyValueStore,
    token: &str,
    data: &SessionData,
) -> Result<(), ApiError> {
    let value = serde_json::to_string(data).map_err(|_| ApiError::internal("serialization"))?;
    kv.set_ex(&session_key(token), &value, SESSION_TTL_SECS).await
}

pub async fn lookup_session(
    kv: &dyn KeyValueStore,
    token: &str,
) -> Result<Option<SessionData>, ApiError> {
    match kv.get(&session_key(token)).await? {
        Some(v) => {
            let data: SessionData = serde_json::from_str(&v)
                .map_err(|_| ApiError::internal("corrupt session data"))?;
            Ok(Some(data))
        }
        None => Ok(None),
    }
}

pub async fn revoke_session(kv: &dyn KeyValueStore, token: &str) -> Result<(), ApiError> {
    kv.del(&session_key(token)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::kv::MemoryStore;

    #[test]
    fn session_tokens_are_prefixed_and_unique() {
        let a = generate_session_token();
        let b = generate_session_token();
        assert!(a.starts_with("fst_"));
        // 32 bytes of unpadded base64.
        assert_eq!(a.len(), 4 + 43);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn sessions_can_be_stored_looked_up_and_revoked() {
        let kv = MemoryStore::new();
        let token = generate_session_token();
        store_session(
            &kv,
            &token,
            &SessionData {
                user_id: "usr_1".into(),
            },
        )
        .await
        .unwrap();

        let data = lookup_session(&kv, &token).await.unwrap().unwrap();
        assert_eq!(data.user_id, "usr_1");

        revoke_session(&kv, &token).await.unwrap();
        assert!(lookup_session(&kv, &token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_session_values_are_errors() {
        let kv = MemoryStore::new();
        kv.set_ex("forum:session:bad", "not json", 60).await.unwrap();
        assert!(lookup_session(&kv, "bad").await.is_err());
    }
}
