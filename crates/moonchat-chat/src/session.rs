use colored::Colorize;
use moonchat_llm_api::{Completer, CompletionOutcome};
use moonchat_types::Message;
use std::future::Future;
use std::io::Write;
use std::path::Path;

use crate::commands::{BangCommand, ReservedCommand, HELP_ENTRIES, RESERVED_ENTRIES};
use crate::input::InputNormalizer;
use crate::recorder::TurnRecorder;
use crate::transcript::{save_transcript, DEFAULT_TRANSCRIPT_PATH};

/// Configured models and which one is active
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSelection {
    models: Vec<String>,
    active: usize,
}

impl ModelSelection {
    /// `active` is clamped into range; an empty list is invalid.
    pub fn new(models: Vec<String>, active: usize) -> Option<Self> {
        if models.is_empty() {
            return None;
        }
        let active = active.min(models.len() - 1);
        Some(Self { models, active })
    }

    pub fn current(&self) -> &str {
        &self.models[self.active]
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Switch to the 1-based model `number`
    pub fn switch(&mut self, number: usize) -> Result<&str, String> {
        if number == 0 || number > self.models.len() {
            return Err(format!(
                "Invalid model number {}. Choose 1-{}",
                number,
                self.models.len()
            ));
        }
        self.active = number - 1;
        Ok(self.current())
    }
}

/// Whether the interactive loop keeps going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Print a streamed delta immediately
pub fn print_delta(delta: &str) {
    print!("{}", delta);
    let _ = std::io::stdout().flush();
}

/// Interactive conversation state: the live message list, its reset
/// baseline, the active model and the stores turns are written to.
pub struct ChatSession {
    completer: Completer,
    normalizer: InputNormalizer,
    recorder: TurnRecorder,
    selection: ModelSelection,
    temperature: f32,
    baseline: Vec<Message>,
    messages: Vec<Message>,
    last_response: Option<String>,
}

impl ChatSession {
    /// `baseline` is background knowledge followed by replayed history
    pub fn new(
        completer: Completer,
        normalizer: InputNormalizer,
        recorder: TurnRecorder,
        selection: ModelSelection,
        temperature: f32,
        baseline: Vec<Message>,
    ) -> Self {
        Self {
            completer,
            normalizer,
            recorder,
            selection,
            temperature,
            messages: baseline.clone(),
            baseline,
            last_response: None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn baseline(&self) -> &[Message] {
        &self.baseline
    }

    /// Messages added during this run, after the baseline
    pub fn session_turns(&self) -> &[Message] {
        &self.messages[self.baseline.len().min(self.messages.len())..]
    }

    pub fn last_response(&self) -> Option<&str> {
        self.last_response.as_deref()
    }

    pub fn current_model(&self) -> &str {
        self.selection.current()
    }

    pub fn selection(&self) -> &ModelSelection {
        &self.selection
    }

    pub fn recorder(&self) -> &TurnRecorder {
        &self.recorder
    }

    /// Handle one input line with no way to interrupt the request
    pub async fn handle_line(&mut self, line: &str) -> Flow {
        self.handle_line_until(line, std::future::pending::<()>()).await
    }

    /// Handle one input line. If `interrupt` completes while a request is in
    /// flight the request is abandoned and nothing is appended or recorded.
    pub async fn handle_line_until<I>(&mut self, line: &str, interrupt: I) -> Flow
    where
        I: Future<Output = ()>,
    {
        let line = line.trim();
        if line.is_empty() {
            return Flow::Continue;
        }

        if let Some(reserved) = ReservedCommand::parse(line) {
            match reserved.apply(self.recorder.history()) {
                Ok(message) => println!("{} {}", "🗂️".bright_cyan(), message),
                Err(e) => eprintln!("{} {}", "❌".bright_red(), e),
            }
            return Flow::Continue;
        }

        match BangCommand::parse(line) {
            Some(command) => self.dispatch(command, interrupt).await,
            None => {
                self.ask(vec![Message::user(line)], interrupt).await;
                Flow::Continue
            }
        }
    }

    async fn dispatch<I>(&mut self, command: BangCommand, interrupt: I) -> Flow
    where
        I: Future<Output = ()>,
    {
        match command {
            BangCommand::Help => print_help(),
            BangCommand::Quit => {
                println!("{}", "Goodbye!".bright_cyan());
                return Flow::Quit;
            }
            BangCommand::Reset => {
                self.reset();
                println!("{}", "🔄 Conversation reset".bright_cyan());
            }
            BangCommand::Save(path) => {
                let path = path.unwrap_or_else(|| DEFAULT_TRANSCRIPT_PATH.to_string());
                save_transcript(self.session_turns(), Path::new(&path));
            }
            BangCommand::File(path) => {
                if let Some(message) = self.load_file(&path).await {
                    self.ask(vec![message], interrupt).await;
                }
            }
            BangCommand::Add(path) => {
                if let Some(message) = self.load_file(&path).await {
                    self.messages.push(message);
                    println!("{} Added file: {}", "📎".bright_green(), path);
                }
            }
            BangCommand::Last => match &self.last_response {
                Some(response) => println!("\n{}\n{}\n", "Last answer:".bright_blue().bold(), response),
                None => println!("{}", "No answer yet".bright_black()),
            },
            BangCommand::Model(None) => self.print_models(),
            BangCommand::Model(Some(arg)) => match arg.parse::<usize>() {
                Ok(number) => match self.selection.switch(number) {
                    Ok(model) => println!("{} Switched to model: {}", "🤖".bright_cyan(), model),
                    Err(e) => eprintln!("{} {}", "❌".bright_red(), e),
                },
                Err(_) => eprintln!(
                    "{} Invalid model number: '{}'. Use !model to list models",
                    "❌".bright_red(),
                    arg
                ),
            },
            BangCommand::Clear => {
                print!("\x1B[2J\x1B[1;1H");
                let _ = std::io::stdout().flush();
            }
            BangCommand::MissingArgument(usage) => {
                eprintln!("{} Usage: {}", "💡".bright_yellow(), usage);
            }
            BangCommand::Unknown(raw) => {
                eprintln!(
                    "{} Unknown command: {} (type !help for commands)",
                    "❌".bright_red(),
                    raw
                );
            }
        }
        Flow::Continue
    }

    /// Restore the conversation to background knowledge plus replayed history
    pub fn reset(&mut self) {
        self.messages = self.baseline.clone();
    }

    async fn load_file(&self, path: &str) -> Option<Message> {
        let file = Path::new(path);
        if !file.is_file() {
            eprintln!("{} File not found: {}", "❌".bright_red(), path);
            return None;
        }
        Some(Message::user(self.normalizer.describe_file(file).await))
    }

    fn print_models(&self) {
        println!("{}", "Available models:".bright_cyan().bold());
        for (i, model) in self.selection.models().iter().enumerate() {
            if i == self.selection.active_index() {
                println!("  {} {}. {}", "▶".bright_green(), i + 1, model.bright_green());
            } else {
                println!("    {}. {}", i + 1, model);
            }
        }
        println!("{}", "Use !model <n> to switch".bright_black());
    }

    /// Send the session plus `new_messages` and record the exchange.
    ///
    /// Both sides are appended to the session only when an answer arrived.
    async fn ask<I>(&mut self, new_messages: Vec<Message>, interrupt: I)
    where
        I: Future<Output = ()>,
    {
        let mut request = self.messages.clone();
        request.extend(new_messages.iter().cloned());
        let model = self.selection.current().to_string();
        let mut sink = print_delta;

        println!("\n{} {}", format!("[{}]", model).bright_magenta(), "Assistant:".bright_blue().bold());

        let outcome = tokio::select! {
            biased;
            _ = interrupt => {
                println!("\n{}", "Request interrupted".bright_yellow());
                return;
            }
            outcome = self.completer.complete(&request, &model, self.temperature, &mut sink) => outcome,
        };

        if outcome.is_fallback() {
            println!("{}", outcome.text().bright_yellow());
        }
        println!("\n");

        let user_content = joined_content(&new_messages);
        self.recorder.record(&user_content, &outcome, &model).await;

        if let CompletionOutcome::Answered(text) = outcome {
            self.messages.extend(new_messages);
            self.messages.push(Message::assistant(text.clone()));
            self.last_response = Some(text);
        }
    }

    pub async fn shutdown(&mut self) {
        self.recorder.shutdown().await;
    }
}

/// Content of several new messages as one stored user turn
pub fn joined_content(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn print_help() {
    println!("\n{}", "Interactive commands".bright_cyan().bold());
    for (command, description) in HELP_ENTRIES {
        println!("  {:<20} {}", command.bright_green(), description);
    }
    println!("\n{}", "History switches (typed alone)".bright_cyan().bold());
    for (command, description) in RESERVED_ENTRIES {
        println!("  {:<20} {}", command.bright_green(), description);
    }
    println!();
}
