use moonchat_types::{Message, BACKGROUND_SPLIT};
use std::path::Path;

use crate::history::StoreError;

/// Split background knowledge into one system message per non-blank segment
pub fn split_background(raw: &str) -> Vec<Message> {
    raw.split(BACKGROUND_SPLIT)
        .filter(|segment| !segment.trim().is_empty())
        .map(Message::system)
        .collect()
}

/// Load the background knowledge file.
///
/// Returns no messages when disabled or when the file does not exist.
pub fn load_background(path: &Path, enabled: bool) -> Result<Vec<Message>, StoreError> {
    if !enabled || !path.is_file() {
        return Ok(Vec::new());
    }
    let bytes = std::fs::read(path).map_err(|e| StoreError::io(path, e))?;
    Ok(split_background(&String::from_utf8_lossy(&bytes)))
}
