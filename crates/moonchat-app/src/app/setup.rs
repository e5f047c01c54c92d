use anyhow::{Context, Result};
use colored::Colorize;
use moonchat_chat::{
    load_background, ConversationLogger, HistoryStore, InputNormalizer, ModelSelection, TurnRecorder,
};
use moonchat_llm_api::{Completer, MoonshotClient, RetryPolicy};
use moonchat_logging::{ensure_private_dir, get_logs_dir, get_moonchat_dir};
use moonchat_types::Message;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::Cli;
use crate::config::credentials::{current_user, prompt_for_key, resolve_api_key, API_KEY_ENV};
use crate::config::Settings;

/// Everything a run needs, derived from CLI arguments and environment
pub struct AppContext {
    pub settings: Settings,
    pub client: Arc<MoonshotClient>,
    pub user: String,
    pub work_dir: PathBuf,
}

/// Set up application configuration from CLI arguments
pub fn setup_from_cli(cli: &Cli) -> Result<AppContext> {
    let data_dir = match &cli.data_dir {
        Some(dir) => {
            ensure_private_dir(dir)?;
            dir.clone()
        }
        None => get_moonchat_dir()?,
    };

    let settings = Settings::load(cli, &data_dir)?;

    let api_key = resolve_api_key(env::var(API_KEY_ENV).ok(), &settings.key_file, prompt_for_key)?;

    let request_log_dir = if settings.verbose {
        Some(get_logs_dir(&data_dir)?)
    } else {
        None
    };
    let client = MoonshotClient::new(api_key, settings.api_url.clone())
        .with_verbose(settings.verbose)
        .with_request_log_dir(request_log_dir);

    let work_dir = env::current_dir().context("Failed to get current directory")?;

    if settings.verbose {
        println!("{}", format!("🔧 DEBUG: data dir: {}", data_dir.display()).bright_black());
        println!("{}", format!("🔧 DEBUG: API URL: {}", settings.api_url).bright_black());
        println!("{}", format!("🔧 DEBUG: models: {:?}", settings.models).bright_black());
    }

    Ok(AppContext {
        settings,
        client: Arc::new(client),
        user: current_user(),
        work_dir,
    })
}

impl AppContext {
    pub fn completer(&self) -> Completer {
        let policy = RetryPolicy::default().with_max_attempts(self.settings.max_attempts);
        Completer::new(self.client.clone(), policy)
    }

    pub fn normalizer(&self) -> InputNormalizer {
        InputNormalizer::new(self.client.clone())
    }

    pub fn history_store(&self) -> HistoryStore {
        HistoryStore::for_user(&self.settings.data_dir, &self.user)
    }

    pub fn model_selection(&self) -> Result<ModelSelection> {
        ModelSelection::new(self.settings.models.clone(), self.settings.active_model)
            .context("The model list is empty")
    }

    /// Background knowledge followed by replayed history. Load failures are
    /// reported and leave that part empty.
    pub fn load_baseline(&self, history: &HistoryStore) -> Vec<Message> {
        let mut messages = match load_background(
            &self.settings.background_file,
            self.settings.background_enabled,
        ) {
            Ok(messages) => messages,
            Err(e) => {
                eprintln!("{} Failed to load background knowledge: {}", "⚠️".yellow(), e);
                Vec::new()
            }
        };

        match history.load() {
            Ok(turns) => messages.extend(turns),
            Err(e) => eprintln!("{} Failed to load history: {}", "⚠️".yellow(), e),
        }

        if self.settings.verbose {
            println!(
                "{}",
                format!("🔧 DEBUG: {} baseline messages (history enabled: {})", messages.len(), history.is_enabled())
                    .bright_black()
            );
        }
        messages
    }

    /// Recorder writing to `history` and, when enabled, the conversation log
    pub async fn recorder(&self, history: HistoryStore) -> TurnRecorder {
        let logger = if self.settings.log_enabled {
            match ConversationLogger::for_user(&self.settings.data_dir, &self.user).await {
                Ok(logger) => Some(logger),
                Err(e) => {
                    eprintln!("{} Logging disabled: {}", "⚠️".yellow(), e);
                    None
                }
            }
        } else {
            None
        };

        TurnRecorder::new(
            history,
            logger,
            self.work_dir.display().to_string(),
            self.user.clone(),
        )
    }
}
