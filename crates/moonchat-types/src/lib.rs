//! Core types and structures for moonchat
//!
//! This crate provides the foundational types used across all moonchat crates.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Constants
// ============================================================================

/// Maximum number of attempts for a completion request
pub const MAX_RETRIES: u32 = 3;

/// Files larger than this are never read into a message (5 MiB)
pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Delimiter between segments of the background knowledge file
pub const BACKGROUND_SPLIT: &str = "#---FILE_SPLIT---";

/// Field delimiter of the legacy history format
pub const LEGACY_FIELD_SPLIT: &str = "\n_|_SPLIT_|_\n";

/// Record terminator of the legacy history format
pub const LEGACY_RECORD_END: &str = "\n_|_END_|_\n";

/// Reply returned once every completion attempt has failed
pub const FALLBACK_REPLY: &str = "Sorry, the request could not be processed. Please try again later.";

// ============================================================================
// Message Types
// ============================================================================

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Capitalised label used in transcripts
    pub fn label(&self) -> &'static str {
        match self {
            Role::System => "System",
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message structure for chat API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

// ============================================================================
// Turn Records
// ============================================================================

/// Replace legacy delimiter and terminator sequences with a single space.
///
/// Applying it twice gives the same result as applying it once.
pub fn sanitize_content(text: &str) -> String {
    text.replace(LEGACY_FIELD_SPLIT, " ")
        .replace(LEGACY_RECORD_END, " ")
}

/// One completed exchange as written to the history and log stores
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub timestamp: String,
    pub working_directory: String,
    pub user: String,
    pub model: String,
    pub user_content: String,
    pub assistant_content: String,
}

impl TurnRecord {
    /// Build a record stamped with the current local time. Both contents are sanitised.
    pub fn new(
        user_content: &str,
        assistant_content: &str,
        model: &str,
        working_directory: &str,
        user: &str,
    ) -> Self {
        Self {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            working_directory: working_directory.to_string(),
            user: user.to_string(),
            model: model.to_string(),
            user_content: sanitize_content(user_content),
            assistant_content: sanitize_content(assistant_content),
        }
    }

    /// The user/assistant message pair this record replays as
    pub fn messages(&self) -> [Message; 2] {
        [
            Message::user(self.user_content.clone()),
            Message::assistant(self.assistant_content.clone()),
        ]
    }
}
