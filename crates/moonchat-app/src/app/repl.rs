use anyhow::Result;
use colored::Colorize;
use moonchat_chat::{ChatSession, Flow};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use super::setup::AppContext;

/// Run interactive REPL mode
pub async fn run_repl_mode(app: AppContext) -> Result<()> {
    println!("{}", "🌙 Moonchat - interactive mode".bright_cyan().bold());
    println!("{}", format!("Working directory: {}", app.work_dir.display()).bright_black());

    let history = app.history_store();
    let baseline = app.load_baseline(&history);
    if history.is_enabled() {
        println!(
            "{} {}",
            "📖".bright_cyan(),
            format!("History enabled: {}", history.path().display()).bright_black()
        );
    }
    if !baseline.is_empty() {
        println!(
            "{} {}",
            "📖".bright_cyan(),
            format!("Loaded {} background/history messages", baseline.len()).bright_black()
        );
    }
    println!("{}", "Type !help for commands, !q to quit\n".bright_black());

    let recorder = app.recorder(history).await;
    let mut session = ChatSession::new(
        app.completer(),
        app.normalizer(),
        recorder,
        app.model_selection()?,
        app.settings.temperature,
        baseline,
    );

    let mut rl = DefaultEditor::new()?;

    loop {
        let model_indicator = format!("[{}]", session.current_model()).bright_magenta();
        let readline = rl.readline(&format!("{} {} ", model_indicator, "You:".bright_green().bold()));

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                // Ctrl-C while the answer streams abandons this request only
                let interrupt = async {
                    if tokio::signal::ctrl_c().await.is_err() {
                        std::future::pending::<()>().await;
                    }
                };

                if session.handle_line_until(line, interrupt).await == Flow::Quit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C (type !q to quit)".bright_black());
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "Goodbye!".bright_cyan());
                break;
            }
            Err(err) => {
                eprintln!("{} {}", "Error:".bright_red().bold(), err);
                break;
            }
        }
    }

    // Graceful shutdown of logger (flush & close)
    session.shutdown().await;

    Ok(())
}
