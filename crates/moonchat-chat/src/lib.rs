//! Conversation management for moonchat
//!
//! This crate assembles the message list sent to the model (background
//! knowledge, replayed history, new input), persists finished exchanges and
//! drives the interactive session.

pub mod commands;
pub mod conversation_logger;
pub mod history;
pub mod input;
pub mod knowledge;
pub mod recorder;
pub mod session;
pub mod transcript;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use commands::{BangCommand, ReservedCommand};
pub use conversation_logger::ConversationLogger;
pub use history::{parse_history, HistoryStore, StoreError};
pub use input::{FileKind, InputNormalizer};
pub use knowledge::{load_background, split_background};
pub use recorder::TurnRecorder;
pub use session::{joined_content, print_delta, ChatSession, Flow, ModelSelection};
pub use transcript::{save_transcript, DEFAULT_TRANSCRIPT_PATH};
