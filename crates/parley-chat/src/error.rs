//! Error types for parley-chat

use thiserror::Error;

/// Failures during a send. None of these escape the dispatcher: each one is
/// converted into an assistant-role chat message at the dispatch boundary.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No credential configured
    #[error("no API key configured")]
    MissingCredential,

    /// An error from the completion client layer
    #[error(transparent)]
    Api(#[from] parley_api::Error),
}
