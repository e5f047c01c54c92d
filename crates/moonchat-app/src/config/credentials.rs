use colored::Colorize;
use rustyline::DefaultEditor;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable checked first for the API key
pub const API_KEY_ENV: &str = "MOONSHOT_API_KEY";

/// No API key in the environment, the key file, or at the prompt
#[derive(Debug, Error)]
#[error("no API key found (set {} or write it to {})", API_KEY_ENV, .key_file.display())]
pub struct MissingCredentialError {
    pub key_file: PathBuf,
}

/// First line of the key file, trimmed. Unreadable files are reported and skipped.
pub fn read_key_file(path: &Path) -> Option<String> {
    if !path.is_file() {
        return None;
    }
    match std::fs::read_to_string(path) {
        Ok(content) => content
            .lines()
            .next()
            .map(|line| line.trim().to_string())
            .filter(|key| !key.is_empty()),
        Err(e) => {
            eprintln!("{} Failed to read key file {}: {}", "⚠️".yellow(), path.display(), e);
            None
        }
    }
}

/// Resolve the API key: environment value, then key file, then `prompt`.
/// The first non-empty value wins.
pub fn resolve_api_key(
    env_value: Option<String>,
    key_file: &Path,
    prompt: impl FnOnce() -> Option<String>,
) -> Result<String, MissingCredentialError> {
    let non_empty = |value: String| {
        let value = value.trim().to_string();
        (!value.is_empty()).then_some(value)
    };

    if let Some(key) = env_value.and_then(non_empty) {
        return Ok(key);
    }
    if let Some(key) = read_key_file(key_file) {
        return Ok(key);
    }

    print_guidance(key_file);
    prompt()
        .and_then(non_empty)
        .ok_or_else(|| MissingCredentialError {
            key_file: key_file.to_path_buf(),
        })
}

/// Explain the ways to provide a key
pub fn print_guidance(key_file: &Path) {
    eprintln!("{} No API key found. Provide one of:", "🔑".yellow());
    eprintln!("  1. export {}='your-key'", API_KEY_ENV);
    eprintln!("  2. write the key as the first line of {}", key_file.display());
    eprintln!("  3. enter it at the prompt below");
}

/// Ask for the key on the terminal
pub fn prompt_for_key() -> Option<String> {
    let mut editor = DefaultEditor::new().ok()?;
    editor.readline("API key: ").ok()
}

/// Name of the OS user, used to key the per-user stores
pub fn current_user() -> String {
    let from_env = ["USER", "LOGNAME", "USERNAME"]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty());

    let name = match from_env {
        Some(name) => name,
        None => fallback_user(),
    };
    sanitize_user(&name)
}

#[cfg(unix)]
fn fallback_user() -> String {
    // SAFETY: getuid has no preconditions and cannot fail
    let uid = unsafe { libc::getuid() };
    uid.to_string()
}

#[cfg(not(unix))]
fn fallback_user() -> String {
    "user".to_string()
}

/// Keep user names safe for use inside file names
fn sanitize_user(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_env_value_wins() {
        let dir = TempDir::new().unwrap();
        let key_file = dir.path().join("key.txt");
        std::fs::write(&key_file, "file-key\n").unwrap();

        let key = resolve_api_key(Some("  env-key ".to_string()), &key_file, || {
            panic!("prompt must not be used")
        })
        .unwrap();
        assert_eq!(key, "env-key");
    }

    #[test]
    fn test_key_file_first_line() {
        let dir = TempDir::new().unwrap();
        let key_file = dir.path().join("key.txt");
        std::fs::write(&key_file, "sk-from-file  \nsecond line\n").unwrap();

        let key = resolve_api_key(Some("   ".to_string()), &key_file, || None).unwrap();
        assert_eq!(key, "sk-from-file");
    }

    #[test]
    fn test_prompt_is_last_resort() {
        let dir = TempDir::new().unwrap();
        let key_file = dir.path().join("key.txt");
        std::fs::write(&key_file, "\n").unwrap();

        let key = resolve_api_key(None, &key_file, || Some("typed-key\n".to_string())).unwrap();
        assert_eq!(key, "typed-key");
    }

    #[test]
    fn test_all_sources_empty_is_an_error() {
        let dir = TempDir::new().unwrap();
        let key_file = dir.path().join("missing.txt");

        let err = resolve_api_key(None, &key_file, || Some(String::new())).unwrap_err();
        assert_eq!(err.key_file, key_file);
        assert!(err.to_string().contains(API_KEY_ENV));
    }

    #[test]
    fn test_sanitize_user() {
        assert_eq!(sanitize_user("alice"), "alice");
        assert_eq!(sanitize_user("DOMAIN\\bob smith"), "DOMAIN_bob_smith");
    }

    #[test]
    #[serial]
    fn test_current_user_from_env() {
        let saved: Vec<(&str, Option<String>)> = ["USER", "LOGNAME", "USERNAME"]
            .iter()
            .map(|name| (*name, std::env::var(name).ok()))
            .collect();

        std::env::set_var("USER", "");
        std::env::set_var("LOGNAME", "moon/walker");
        std::env::remove_var("USERNAME");
        let user = current_user();

        for (name, value) in saved {
            match value {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }
        assert_eq!(user, "moon_walker");
    }
}
