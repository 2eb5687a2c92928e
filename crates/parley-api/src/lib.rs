//! parley-api: client for OpenAI-compatible completion endpoints
//!
//! This crate provides the wire types and the non-streaming HTTP client used
//! to turn a conversation transcript into a single completion.

pub mod client;
pub mod error;
pub mod types;

pub use client::{CompletionApi, CompletionClient};
pub use error::{Error, Result};
pub use types::*;
