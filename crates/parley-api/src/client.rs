//! Non-streaming client for the chat completions endpoint

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    types::{CompletionOptions, TranscriptMessage},
};

/// Message shown when a failure body carries no `error.message`
const GENERIC_ERROR: &str = "completion request failed";

/// Seam between the dispatcher and the HTTP layer
#[async_trait]
pub trait CompletionApi: Send + Sync {
    /// Request a completion for the transcript, returning the reply text
    async fn complete(
        &self,
        credential: &str,
        transcript: &[TranscriptMessage],
        options: &CompletionOptions,
    ) -> Result<String>;
}

/// HTTP client for an OpenAI-compatible completion endpoint
pub struct CompletionClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl CompletionClient {
    /// Create a client for a base URL (e.g. `https://api.openai.com/v1`)
    /// and a model identifier
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    fn build_request<'a>(
        &'a self,
        transcript: &'a [TranscriptMessage],
        options: &CompletionOptions,
    ) -> CompletionRequest<'a> {
        CompletionRequest {
            model: &self.model,
            messages: transcript,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        }
    }
}

#[async_trait]
impl CompletionApi for CompletionClient {
    async fn complete(
        &self,
        credential: &str,
        transcript: &[TranscriptMessage],
        options: &CompletionOptions,
    ) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = self.build_request(transcript, options);

        tracing::debug!(url = %url, messages = transcript.len(), "sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(credential)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::debug!(status = %status, "completion request failed");
            return Err(Error::api(extract_error_message(&body)));
        }

        extract_completion_text(&body)
    }
}

/// Pull `choices[0].message.content` out of a success body
fn extract_completion_text(body: &str) -> Result<String> {
    let parsed: CompletionResponse = serde_json::from_str(body)?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::UnexpectedResponse("missing choices[0]".to_string()))?;
    Ok(choice.message.content)
}

/// Pull `error.message` out of a failure body, falling back to a generic
/// message when the body is empty, unparseable, or shaped differently
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .map(|e| e.message)
        .unwrap_or_else(|| GENERIC_ERROR.to_string())
}

// Request/Response types

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [TranscriptMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_shape() {
        let client = CompletionClient::new("https://api.openai.com/v1/", "gpt-4o-mini");
        let transcript = vec![
            TranscriptMessage::user("hello"),
            TranscriptMessage::assistant("hi there"),
            TranscriptMessage::user("how are you?"),
        ];
        let request = client.build_request(&transcript, &CompletionOptions::default());
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][1]["role"], "assistant");
        assert_eq!(body["messages"][2]["content"], "how are you?");
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert_eq!(body["max_tokens"], 1000);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = CompletionClient::new("http://localhost:8080/v1///", "test");
        assert_eq!(client.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn parse_text_response() {
        let json = serde_json::json!({
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "Hello!" },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 5 }
        })
        .to_string();
        assert_eq!(extract_completion_text(&json).unwrap(), "Hello!");
    }

    #[test]
    fn parse_missing_choices() {
        let json = serde_json::json!({ "model": "gpt-4o-mini", "choices": [] }).to_string();
        let err = extract_completion_text(&json).unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse(_)));
    }

    #[test]
    fn parse_malformed_body() {
        let err = extract_completion_text("not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn error_message_from_body() {
        let json = serde_json::json!({
            "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" }
        })
        .to_string();
        assert_eq!(extract_error_message(&json), "Incorrect API key provided");
    }

    #[test]
    fn error_message_fallback_when_absent() {
        assert_eq!(extract_error_message("{}"), GENERIC_ERROR);
        assert_eq!(extract_error_message(""), GENERIC_ERROR);
        assert_eq!(extract_error_message("<html>bad gateway</html>"), GENERIC_ERROR);
    }
}
