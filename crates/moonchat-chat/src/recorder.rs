use colored::Colorize;
use moonchat_llm_api::CompletionOutcome;
use moonchat_types::TurnRecord;

use crate::conversation_logger::ConversationLogger;
use crate::history::HistoryStore;

/// Writes finished exchanges to the log and history stores.
///
/// Every exchange, fallback replies included, goes to the log store and,
/// while it is enabled, to the history store.
pub struct TurnRecorder {
    history: HistoryStore,
    logger: Option<ConversationLogger>,
    working_directory: String,
    user: String,
}

impl TurnRecorder {
    pub fn new(
        history: HistoryStore,
        logger: Option<ConversationLogger>,
        working_directory: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            history,
            logger,
            working_directory: working_directory.into(),
            user: user.into(),
        }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Persist one exchange. Store failures are reported and swallowed.
    pub async fn record(&mut self, user_content: &str, outcome: &CompletionOutcome, model: &str) {
        let record = TurnRecord::new(
            user_content,
            outcome.text(),
            model,
            &self.working_directory,
            &self.user,
        );

        if let Some(logger) = &mut self.logger {
            if let Err(e) = logger.append(&record).await {
                eprintln!("{} {}", "[Logging error]".yellow(), e);
            }
        }

        if self.history.is_enabled() {
            if let Err(e) = self.history.append(&record) {
                eprintln!("{} Failed to write history: {}", "⚠️".yellow(), e);
            }
        }
    }

    pub async fn shutdown(&mut self) {
        if let Some(logger) = &mut self.logger {
            logger.shutdown().await;
        }
    }
}
