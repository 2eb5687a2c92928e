//! parley-chat: conversation state and message dispatch
//!
//! This crate holds the conversation store, the persistence seam behind it,
//! and the dispatcher that forwards user messages to the completion endpoint
//! and folds the outcome back into the conversation.

pub mod conversation;
pub mod dispatch;
pub mod error;
pub mod storage;
pub mod store;

pub use conversation::{ChatMessage, Conversation, DEFAULT_TITLE};
pub use dispatch::Dispatcher;
pub use error::DispatchError;
pub use storage::{FileStore, MemoryStore, StateStore};
pub use store::ChatStore;
