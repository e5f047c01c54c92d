// Logging module - request diagnostics and data directory helpers
pub mod request_logger;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub use request_logger::{
    log_request,
    log_request_to_file,
    log_response,
    log_stream_chunk,
};

/// Environment variable that relocates the data directory
pub const MOONCHAT_HOME_ENV: &str = "MOONCHAT_HOME";

/// Safely truncate a string to a maximum number of characters
pub fn safe_truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        // Reserve space for "..." suffix
        let trunc_chars = max_chars.saturating_sub(3);
        format!("{}...", s.chars().take(trunc_chars).collect::<String>())
    }
}

/// Create `dir` (and parents) if missing, restricting it to the owner.
pub fn ensure_private_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700))
                .with_context(|| format!("Failed to restrict permissions on {}", dir.display()))?;
        }
    }
    Ok(())
}

/// Get or create the base moonchat directory ($MOONCHAT_HOME or ~/.moonchat)
/// This holds the key file, background knowledge, history and logs
pub fn get_moonchat_dir() -> Result<PathBuf> {
    let moonchat_dir = match std::env::var(MOONCHAT_HOME_ENV) {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => {
            let home_dir = std::env::var("HOME")
                .or_else(|_| std::env::var("USERPROFILE"))
                .context("Failed to get home directory")?;
            PathBuf::from(home_dir).join(".moonchat")
        }
    };

    ensure_private_dir(&moonchat_dir)?;
    Ok(moonchat_dir)
}

/// Get or create the request logs directory (<moonchat dir>/logs)
pub fn get_logs_dir(moonchat_dir: &Path) -> Result<PathBuf> {
    let logs_dir = moonchat_dir.join("logs");
    ensure_private_dir(&logs_dir)?;
    Ok(logs_dir)
}
