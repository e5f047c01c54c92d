use async_trait::async_trait;
use moonchat_types::Message;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

pub mod moonshot;
pub mod stream;

/// Chat completion request body (OpenAI-compatible format)
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub temperature: f32,
    pub stream: bool,
}

impl<'a> CompletionRequest<'a> {
    /// Streaming request for `messages` against `model`
    pub fn streaming(model: &'a str, messages: &'a [Message], temperature: f32) -> Self {
        Self {
            model,
            messages,
            temperature,
            stream: true,
        }
    }
}

/// Failure of a single call to the completion provider
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("API error: {0}")]
    Api(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

impl CompletionError {
    /// Whether resending the identical request could succeed.
    ///
    /// Network failures, timeouts, 408/429 and 5xx responses are retryable;
    /// other 4xx responses, provider-reported errors and local I/O are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            CompletionError::Transport(e) => !e.is_builder(),
            CompletionError::Status { status, .. } => {
                *status == 408 || *status == 429 || *status >= 500
            }
            CompletionError::InvalidResponse(_) => true,
            CompletionError::Api(_) | CompletionError::Io(_) => false,
        }
    }
}

/// Completion backend trait - one streamed chat call, no retry
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Send `request`, pass every content delta to `sink` as it arrives and
    /// return the accumulated answer.
    async fn stream_chat(
        &self,
        request: &CompletionRequest<'_>,
        sink: &mut (dyn for<'d> FnMut(&'d str) + Send),
    ) -> Result<String, CompletionError>;
}

/// Remote text extraction for document files (PDF and office formats)
#[async_trait]
pub trait FileExtractor: Send + Sync {
    /// Upload `path`, fetch the extracted text and delete the remote copy.
    async fn extract_text(&self, path: &Path) -> Result<String, CompletionError>;
}
