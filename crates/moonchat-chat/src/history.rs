use moonchat_types::{Message, TurnRecord, LEGACY_FIELD_SPLIT, LEGACY_RECORD_END};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure reading or writing one of the on-disk stores
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Restrict a store file to its owner
pub(crate) fn restrict_to_owner(path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Parse the contents of a history store into alternating user/assistant messages.
///
/// JSON lines are the native format. Chunks written in the old delimited
/// format are still understood: the last two fields of each record are the
/// user and assistant text. Records with fewer than two fields and lines that
/// are not valid JSON are skipped.
pub fn parse_history(raw: &str) -> Vec<Message> {
    let mut messages = Vec::new();

    for chunk in raw.split(LEGACY_RECORD_END) {
        if chunk.contains(LEGACY_FIELD_SPLIT) {
            let fields: Vec<&str> = chunk.trim().split(LEGACY_FIELD_SPLIT).collect();
            if fields.len() >= 2 {
                messages.push(Message::user(fields[fields.len() - 2]));
                messages.push(Message::assistant(fields[fields.len() - 1]));
            }
            continue;
        }

        for line in chunk.lines().map(str::trim).filter(|line| !line.is_empty()) {
            if let Ok(record) = serde_json::from_str::<TurnRecord>(line) {
                messages.extend(record.messages());
            }
        }
    }

    messages
}

/// Per-user store of past turns replayed into new sessions.
///
/// Whether the file exists is the history-enable flag: turns are only
/// recorded while it is present.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `history_<user>.jsonl` inside the data directory
    pub fn for_user(data_dir: &Path, user: &str) -> Self {
        Self::new(data_dir.join(format!("history_{}.jsonl", user)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_enabled(&self) -> bool {
        self.path.is_file()
    }

    /// Replay every stored turn. A missing store is an empty history.
    pub fn load(&self) -> Result<Vec<Message>, StoreError> {
        if !self.is_enabled() {
            return Ok(Vec::new());
        }
        let bytes = fs::read(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        Ok(parse_history(&String::from_utf8_lossy(&bytes)))
    }

    /// Append one record as a JSON line
    pub fn append(&self, record: &TurnRecord) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| StoreError::io(&self.path, e))?;
        restrict_to_owner(&self.path).map_err(|e| StoreError::io(&self.path, e))
    }

    /// Create the store if it is missing, turning recording on
    pub fn enable(&self) -> Result<(), StoreError> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))?;
        restrict_to_owner(&self.path).map_err(|e| StoreError::io(&self.path, e))
    }

    /// Delete the store, turning recording off. Returns whether it existed.
    pub fn disable(&self) -> Result<bool, StoreError> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        Ok(true)
    }

    /// Drop every stored turn and leave an empty, enabled store
    pub fn reset(&self) -> Result<(), StoreError> {
        self.disable()?;
        self.enable()
    }
}
