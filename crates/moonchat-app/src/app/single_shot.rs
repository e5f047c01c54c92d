use anyhow::Result;
use colored::Colorize;
use moonchat_chat::{joined_content, print_delta, ReservedCommand};
use std::path::Path;

use super::setup::AppContext;

/// Answer one question built from `inputs`, then exit
pub async fn run_single_shot(app: AppContext, inputs: &[String]) -> Result<()> {
    let history = app.history_store();

    // A reserved word only counts when it is not also the name of a file
    if let Some(first) = inputs.first() {
        if !Path::new(first).is_file() {
            if let Some(command) = ReservedCommand::parse(first) {
                match command.apply(&history) {
                    Ok(message) => println!("{} {}", "🗂️".bright_cyan(), message),
                    Err(e) => eprintln!("{} {}", "❌".bright_red(), e),
                }
                return Ok(());
            }
        }
    }

    let mut messages = app.load_baseline(&history);
    let new_messages = app.normalizer().normalize(inputs).await;
    messages.extend(new_messages.iter().cloned());

    let selection = app.model_selection()?;
    let model = selection.current();

    println!("\n{} {}", format!("[{}]", model).bright_magenta(), "Assistant:".bright_blue().bold());
    let outcome = app
        .completer()
        .complete(&messages, model, app.settings.temperature, &mut print_delta)
        .await;
    if outcome.is_fallback() {
        println!("{}", outcome.text().bright_yellow());
    }
    println!();

    let mut recorder = app.recorder(history).await;
    recorder
        .record(&joined_content(&new_messages), &outcome, model)
        .await;
    recorder.shutdown().await;

    Ok(())
}
