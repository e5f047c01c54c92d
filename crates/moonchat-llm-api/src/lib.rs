//! # moonchat-llm-api
//!
//! Completion client for OpenAI-compatible chat endpoints (Moonshot by default).
//!
//! ## Features
//!
//! - **Streaming**: content deltas are handed to a sink as they arrive and
//!   accumulated into the final answer
//! - **Bounded retry**: [`Completer`] retries transient failures with
//!   exponential backoff and degrades to a fixed fallback reply
//! - **Document extraction**: upload/retrieve/delete through the provider's
//!   file API
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use moonchat_llm_api::{Completer, MoonshotClient, RetryPolicy};
//! use moonchat_types::Message;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = MoonshotClient::new("your-api-key".to_string(), "https://api.moonshot.cn/v1".to_string());
//!     let completer = Completer::new(Arc::new(client), RetryPolicy::default());
//!
//!     let messages = vec![Message::user("Hello!")];
//!     let outcome = completer
//!         .complete(&messages, "kimi-latest", 0.3, &mut |delta: &str| print!("{}", delta))
//!         .await;
//!     println!("\n{}", outcome.text());
//! }
//! ```

pub mod client;
pub mod config;
pub mod retry;

// Re-export commonly used types
pub use client::{
    CompletionBackend,
    CompletionError,
    CompletionRequest,
    FileExtractor,
    moonshot::MoonshotClient,
    stream::SseParser,
};

pub use config::{
    MOONSHOT_API_URL,
    DEFAULT_MODELS,
    DEFAULT_TEMPERATURE,
    normalize_api_base,
    chat_completions_url,
    files_url,
};

pub use retry::{Completer, CompletionOutcome, RetryPolicy};
