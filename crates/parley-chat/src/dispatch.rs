//! Message dispatch: optimistic append, completion call, and the conversion
//! of failures into chat text
//!
//! Every send appends exactly two messages to the conversation: the user's
//! own message immediately, then one assistant-role follow-up carrying either
//! the completion or the failure text. The transcript keeps its alternating
//! append-log shape even when the network call fails.

use std::sync::Arc;

use parley_api::{CompletionApi, CompletionOptions, TranscriptMessage};
use tracing::debug;

use crate::conversation::ChatMessage;
use crate::error::DispatchError;
use crate::store::ChatStore;

/// Prefix of the synthesized assistant message that reports a failed send
pub const ERROR_PREFIX: &str = "Error: ";

/// Orchestrates sends against the completion endpoint
pub struct Dispatcher {
    api: Arc<dyn CompletionApi>,
    options: CompletionOptions,
}

impl Dispatcher {
    /// Create a dispatcher over a completion backend, using the fixed
    /// default sampling options
    pub fn new(api: Arc<dyn CompletionApi>) -> Self {
        Self {
            api,
            options: CompletionOptions::default(),
        }
    }

    /// Send `content` to the active conversation, creating one first when
    /// nothing usable is active.
    ///
    /// Never returns an error: any failure between the credential check and
    /// the response parse becomes an assistant message prefixed with
    /// [`ERROR_PREFIX`]. The busy flag is reset on every exit path.
    ///
    /// Overlapping sends to the same conversation are not serialized; `&mut`
    /// access makes overlap impossible within one store, and the busy flag
    /// stays advisory.
    pub async fn send_message(&self, store: &mut ChatStore, content: &str) {
        let conversation_id = match store.active_conversation().map(|c| c.id) {
            Some(id) => id,
            None => store.create_conversation(),
        };

        // The outgoing transcript is everything already in the thread plus
        // the new content at the end. Snapshot before the optimistic append
        // so the new content appears exactly once.
        let mut transcript: Vec<TranscriptMessage> = store
            .conversation(conversation_id)
            .map(|c| {
                c.messages
                    .iter()
                    .map(|m| TranscriptMessage {
                        role: m.role,
                        content: m.content.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        transcript.push(TranscriptMessage::user(content));

        store.append_message(conversation_id, ChatMessage::user(content));
        store.set_busy(true);

        let reply = match self.request_completion(store.credential(), &transcript).await {
            Ok(text) => text,
            Err(e) => {
                debug!("send failed: {e}");
                format!("{ERROR_PREFIX}{e}")
            }
        };

        store.append_message(conversation_id, ChatMessage::assistant(reply));
        store.set_busy(false);
    }

    async fn request_completion(
        &self,
        credential: &str,
        transcript: &[TranscriptMessage],
    ) -> Result<String, DispatchError> {
        if credential.is_empty() {
            return Err(DispatchError::MissingCredential);
        }

        debug!(messages = transcript.len(), "requesting completion");
        Ok(self
            .api
            .complete(credential, transcript, &self.options)
            .await?)
    }
}
