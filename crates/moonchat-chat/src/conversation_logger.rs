use moonchat_types::TurnRecord;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::history::{restrict_to_owner, StoreError};

/// Append-only JSONL audit log of every exchange, including failed ones
pub struct ConversationLogger {
    file_path: PathBuf,
    file: Option<tokio::fs::File>,
}

impl ConversationLogger {
    /// Open (or create) the log file at `file_path` in append mode.
    pub async fn open(file_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StoreError::io(parent, e))?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)
            .await
            .map_err(|e| StoreError::io(file_path, e))?;
        restrict_to_owner(file_path).map_err(|e| StoreError::io(file_path, e))?;

        Ok(Self {
            file_path: file_path.to_path_buf(),
            file: Some(file),
        })
    }

    /// `log_<user>.jsonl` inside the data directory
    pub async fn for_user(data_dir: &Path, user: &str) -> Result<Self, StoreError> {
        Self::open(&data_dir.join(format!("log_{}.jsonl", user))).await
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Append a single record as one JSON line.
    pub async fn append(&mut self, record: &TurnRecord) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        if let Some(file) = &mut self.file {
            file.write_all(line.as_bytes())
                .await
                .map_err(|e| StoreError::io(&self.file_path, e))?;
            file.flush()
                .await
                .map_err(|e| StoreError::io(&self.file_path, e))?;
            restrict_to_owner(&self.file_path).map_err(|e| StoreError::io(&self.file_path, e))?;
        }
        Ok(())
    }

    /// Close the logger (explicit drop). Called on graceful shutdown.
    pub async fn shutdown(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.sync_all().await;
        }
    }
}
