use colored::Colorize;
use moonchat_types::Message;
use std::path::Path;

/// Where `!save` writes when no path is given
pub const DEFAULT_TRANSCRIPT_PATH: &str = "moonchat_transcript.txt";

/// Render messages as a plain-text transcript with indented bodies
pub fn format_transcript(messages: &[Message]) -> String {
    let mut out = String::new();
    for message in messages {
        out.push_str(message.role.label());
        out.push_str(":\n    ");
        out.push_str(&message.content.replace('\n', "\n    "));
        out.push_str("\n\n");
    }
    out
}

/// Overwrite `path` with a transcript of `messages`.
///
/// Reports the outcome on the console and returns whether the write succeeded.
pub fn save_transcript(messages: &[Message], path: &Path) -> bool {
    match std::fs::write(path, format_transcript(messages)) {
        Ok(()) => {
            println!(
                "{} Saved {} messages to {}",
                "💾".bright_green(),
                messages.len(),
                path.display()
            );
            true
        }
        Err(e) => {
            eprintln!("{} Failed to save transcript to {}: {}", "❌".bright_red(), path.display(), e);
            false
        }
    }
}
