//! Durable key-value storage for store state
//!
//! Two entries are persisted: the JSON-serialized conversation list and the
//! plain credential string. They are written independently after each state
//! change; no transactional grouping is attempted across the two.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::conversation::Conversation;

/// Storage seam behind the conversation store
pub trait StateStore: Send {
    /// Load the saved conversation list; empty when nothing was saved
    fn load_conversations(&self) -> io::Result<Vec<Conversation>>;

    /// Replace the saved conversation list
    fn save_conversations(&self, conversations: &[Conversation]) -> io::Result<()>;

    /// Load the saved credential, if any
    fn load_credential(&self) -> io::Result<Option<String>>;

    /// Replace the saved credential
    fn save_credential(&self, credential: &str) -> io::Result<()>;
}

/// File-backed store: `conversations.json` and `credential` under one
/// directory, written synchronously on each save
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created lazily on
    /// first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Default data directory
    pub fn default_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("parley")
    }

    fn conversations_path(&self) -> PathBuf {
        self.dir.join("conversations.json")
    }

    fn credential_path(&self) -> PathBuf {
        self.dir.join("credential")
    }
}

impl StateStore for FileStore {
    fn load_conversations(&self) -> io::Result<Vec<Conversation>> {
        let path = self.conversations_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(io::Error::other)
    }

    fn save_conversations(&self, conversations: &[Conversation]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string(conversations).map_err(io::Error::other)?;
        fs::write(self.conversations_path(), json)
    }

    fn load_credential(&self) -> io::Result<Option<String>> {
        let path = self.credential_path();
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(path).map(Some)
    }

    fn save_credential(&self, credential: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.credential_path(), credential)
    }
}

/// In-process store holding the same serialized form the file store writes.
/// Clones share state, so a clone kept outside a [`crate::ChatStore`] can
/// observe and replay what the store persisted. Used by tests.
#[derive(Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    conversations: Option<String>,
    credential: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_poisoned() -> io::Error {
    io::Error::other("memory store lock poisoned")
}

impl StateStore for MemoryStore {
    fn load_conversations(&self) -> io::Result<Vec<Conversation>> {
        let inner = self.inner.lock().map_err(|_| lock_poisoned())?;
        match &inner.conversations {
            Some(json) => serde_json::from_str(json).map_err(io::Error::other),
            None => Ok(Vec::new()),
        }
    }

    fn save_conversations(&self, conversations: &[Conversation]) -> io::Result<()> {
        let json = serde_json::to_string(conversations).map_err(io::Error::other)?;
        let mut inner = self.inner.lock().map_err(|_| lock_poisoned())?;
        inner.conversations = Some(json);
        Ok(())
    }

    fn load_credential(&self) -> io::Result<Option<String>> {
        let inner = self.inner.lock().map_err(|_| lock_poisoned())?;
        Ok(inner.credential.clone())
    }

    fn save_credential(&self, credential: &str) -> io::Result<()> {
        let mut inner = self.inner.lock().map_err(|_| lock_poisoned())?;
        inner.credential = Some(credential.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{ChatMessage, Conversation};

    fn temp_store() -> FileStore {
        let dir = std::env::temp_dir().join(format!("parley-storage-{}", uuid::Uuid::new_v4()));
        FileStore::new(dir)
    }

    #[test]
    fn file_store_empty_when_nothing_saved() {
        let store = temp_store();
        assert!(store.load_conversations().unwrap().is_empty());
        assert!(store.load_credential().unwrap().is_none());
    }

    #[test]
    fn file_store_round_trips_conversations() {
        let store = temp_store();

        let mut conversation = Conversation::new();
        conversation.messages.push(ChatMessage::user("hello"));
        conversation.messages.push(ChatMessage::assistant("hi!"));
        let saved = vec![conversation];

        store.save_conversations(&saved).unwrap();
        let loaded = store.load_conversations().unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, saved[0].id);
        assert_eq!(loaded[0].created_at, saved[0].created_at);
        assert_eq!(loaded[0].updated_at, saved[0].updated_at);
        assert_eq!(loaded[0].messages.len(), 2);
        assert_eq!(loaded[0].messages[0].id, saved[0].messages[0].id);
        assert_eq!(loaded[0].messages[0].role, saved[0].messages[0].role);
        assert_eq!(loaded[0].messages[0].content, "hello");
        assert_eq!(loaded[0].messages[0].created_at, saved[0].messages[0].created_at);
        assert_eq!(loaded[0].messages[1].content, "hi!");

        fs::remove_dir_all(&store.dir).unwrap();
    }

    #[test]
    fn file_store_round_trips_credential() {
        let store = temp_store();
        store.save_credential("sk-test-123").unwrap();
        assert_eq!(store.load_credential().unwrap().as_deref(), Some("sk-test-123"));

        fs::remove_dir_all(&store.dir).unwrap();
    }

    #[test]
    fn memory_store_clones_share_state() {
        let store = MemoryStore::new();
        let observer = store.clone();

        store.save_credential("token").unwrap();
        assert_eq!(observer.load_credential().unwrap().as_deref(), Some("token"));
    }
}
