//! Conversation store: the single source of truth for chat state
//!
//! All mutation funnels through the named operations below; each change to
//! the conversation list or the credential is written through to the backing
//! [`StateStore`] before the operation returns. The store itself never fails:
//! persistence problems are logged and the in-memory state stays
//! authoritative.

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::conversation::{ChatMessage, Conversation, DEFAULT_TITLE, derive_title};
use crate::storage::StateStore;

/// Holds every conversation, the active selection, the credential, and the
/// advisory busy flag
pub struct ChatStore {
    conversations: Vec<Conversation>,
    active_id: Option<Uuid>,
    credential: String,
    busy: bool,
    storage: Box<dyn StateStore>,
}

impl ChatStore {
    /// Rehydrate a store from whatever the backing storage holds. Missing or
    /// unreadable saved state yields an empty store with no active
    /// conversation.
    pub fn open(storage: Box<dyn StateStore>) -> Self {
        let conversations = match storage.load_conversations() {
            Ok(list) => list,
            Err(e) => {
                warn!("failed to load saved conversations: {e}");
                Vec::new()
            }
        };
        let credential = match storage.load_credential() {
            Ok(saved) => saved.unwrap_or_default(),
            Err(e) => {
                warn!("failed to load saved credential: {e}");
                String::new()
            }
        };

        Self {
            conversations,
            active_id: None,
            credential,
            busy: false,
            storage,
        }
    }

    /// Create a conversation with a fresh id, default title, and empty
    /// message list, and make it active. Returns the new id.
    pub fn create_conversation(&mut self) -> Uuid {
        let conversation = Conversation::new();
        let id = conversation.id;
        self.conversations.push(conversation);
        self.active_id = Some(id);
        self.persist_conversations();
        id
    }

    /// Set the active conversation id unconditionally.
    ///
    /// A dangling id is tolerated: the dispatcher treats it the same as no
    /// selection and creates a fresh conversation on the next send.
    pub fn select_conversation(&mut self, id: Uuid) {
        if !self.conversations.iter().any(|c| c.id == id) {
            warn!(%id, "selecting unknown conversation");
        }
        self.active_id = Some(id);
    }

    /// Append a message to the conversation matching `id`, bumping its
    /// `updated_at`. The title derives from the first message while it is
    /// still the default. No-op when nothing matches.
    pub fn append_message(&mut self, id: Uuid, message: ChatMessage) {
        let Some(conversation) = self.conversations.iter_mut().find(|c| c.id == id) else {
            warn!(%id, "appending to unknown conversation");
            return;
        };

        if conversation.messages.is_empty() && conversation.title == DEFAULT_TITLE {
            conversation.title = derive_title(&message.content);
        }
        conversation.messages.push(message);
        conversation.updated_at = Utc::now();
        self.persist_conversations();
    }

    /// Empty the active conversation's message list, keeping its identity and
    /// `created_at` while bumping `updated_at`. No-op when nothing is active.
    pub fn clear_messages(&mut self) {
        let Some(id) = self.active_id else {
            return;
        };
        let Some(conversation) = self.conversations.iter_mut().find(|c| c.id == id) else {
            return;
        };

        conversation.messages.clear();
        conversation.updated_at = Utc::now();
        self.persist_conversations();
    }

    /// Replace the stored credential
    pub fn set_credential(&mut self, value: impl Into<String>) {
        self.credential = value.into();
        if let Err(e) = self.storage.save_credential(&self.credential) {
            warn!("failed to persist credential: {e}");
        }
    }

    /// Toggle the global busy indicator. Advisory only; nothing blocks on it.
    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    /// All conversations, in creation order
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Look up a conversation by id
    pub fn conversation(&self, id: Uuid) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    /// The active conversation, or `None` when nothing is selected or the
    /// selection dangles
    pub fn active_conversation(&self) -> Option<&Conversation> {
        let id = self.active_id?;
        self.conversations.iter().find(|c| c.id == id)
    }

    /// The raw active id, dangling or not
    pub fn active_id(&self) -> Option<Uuid> {
        self.active_id
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    fn persist_conversations(&mut self) {
        if let Err(e) = self.storage.save_conversations(&self.conversations) {
            warn!("failed to persist conversations: {e}");
        }
    }
}
