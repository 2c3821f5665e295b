use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Identifier and object-key layout for persisted chats.
///
/// ```text
/// <prefix>/<chat_id>/chat.json
/// <prefix>/<chat_id>/messages/<nanos>-<uuid>.json
/// ```
pub struct StorageManager;

impl StorageManager {
    pub fn new_chat_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn new_message_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn chat_key(prefix: &str, chat_id: &str) -> String {
        format!("{}/{}/chat.json", prefix.trim_end_matches('/'), chat_id)
    }

    pub fn messages_prefix(prefix: &str, chat_id: &str) -> String {
        format!("{}/{}/messages/", prefix.trim_end_matches('/'), chat_id)
    }

    /// Zero-padded nanosecond timestamps keep lexical key order chronological.
    pub fn message_key(prefix: &str, chat_id: &str, created_at: DateTime<Utc>) -> String {
        let nanos = created_at
            .timestamp_nanos_opt()
            .unwrap_or_else(|| created_at.timestamp_micros().saturating_mul(1000));
        format!(
            "{}{:020}-{}.json",
            Self::messages_prefix(prefix, chat_id),
            nanos.max(0),
            Uuid::new_v4().simple()
        )
    }
}
