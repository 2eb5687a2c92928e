//! Conversation threads and the messages they hold

use chrono::{DateTime, Utc};
use parley_api::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to a conversation before its first message
pub const DEFAULT_TITLE: &str = "New chat";

/// Longest auto-derived title, in characters
const TITLE_MAX_CHARS: usize = 30;

/// One turn in a conversation. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    /// Message text; may contain markdown, rendered elsewhere
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a message authored now with a fresh id
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A named, ordered thread of messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create an empty conversation with the default title
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive a conversation title from the leading text of its first message.
/// Truncation respects Unicode char boundaries, not bytes.
pub(crate) fn derive_title(content: &str) -> String {
    let mut chars = content.chars();
    let title: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", title)
    } else {
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_title_short_content_unchanged() {
        assert_eq!(derive_title("hello"), "hello");
    }

    #[test]
    fn derive_title_exactly_max_unchanged() {
        let content = "a".repeat(30);
        assert_eq!(derive_title(&content), content);
    }

    #[test]
    fn derive_title_long_content_truncated() {
        let content = "a".repeat(31);
        let title = derive_title(&content);
        assert_eq!(title, format!("{}...", "a".repeat(30)));
    }

    #[test]
    fn derive_title_counts_chars_not_bytes() {
        let content = "é".repeat(40);
        let title = derive_title(&content);
        assert_eq!(title, format!("{}...", "é".repeat(30)));
    }

    #[test]
    fn new_conversation_has_default_title_and_no_messages() {
        let conversation = Conversation::new();
        assert_eq!(conversation.title, DEFAULT_TITLE);
        assert!(conversation.messages.is_empty());
        assert_eq!(conversation.created_at, conversation.updated_at);
    }
}
