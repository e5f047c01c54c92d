use moonchat_llm_api::FileExtractor;
use moonchat_types::{Message, MAX_FILE_SIZE};
use std::path::Path;
use std::sync::Arc;

const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "py", "js", "ts", "rs", "html", "css", "json", "csv", "toml", "yaml", "yml",
    "xml", "sh", "c", "h", "cpp", "go", "java", "log", "ini",
];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac", "m4a"];
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "docx", "xlsx", "pptx"];

const MIB: f64 = 1024.0 * 1024.0;

/// How a file is turned into message text, by extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKind {
    Text,
    Image,
    Audio,
    Document,
    /// Carries the extension as written (e.g. `.exe`, empty when there is none)
    Unsupported(String),
}

impl FileKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if TEXT_EXTENSIONS.contains(&ext.as_str()) {
            FileKind::Text
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            FileKind::Image
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            FileKind::Audio
        } else if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
            FileKind::Document
        } else if ext.is_empty() {
            FileKind::Unsupported(String::new())
        } else {
            FileKind::Unsupported(format!(".{}", ext))
        }
    }
}

/// Turns raw input tokens (literal text or file paths) into user messages
#[derive(Clone)]
pub struct InputNormalizer {
    extractor: Arc<dyn FileExtractor>,
    max_file_size: u64,
}

impl InputNormalizer {
    pub fn new(extractor: Arc<dyn FileExtractor>) -> Self {
        Self {
            extractor,
            max_file_size: MAX_FILE_SIZE,
        }
    }

    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// One user message per input, in order. Inputs naming an existing file
    /// are replaced by a description of the file's content.
    pub async fn normalize(&self, inputs: &[String]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(inputs.len());
        for input in inputs {
            let path = Path::new(input);
            if path.is_file() {
                messages.push(Message::user(self.describe_file(path).await));
            } else {
                messages.push(Message::user(input.clone()));
            }
        }
        messages
    }

    /// Message text for a single file
    pub async fn describe_file(&self, path: &Path) -> String {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let size = match std::fs::metadata(path) {
            Ok(metadata) => metadata.len(),
            Err(e) => return format!("Failed to read file '{}': {}", name, e),
        };
        if size > self.max_file_size {
            return format!(
                "File '{}' is too large ({:.2} MiB > {} MiB), skipped",
                name,
                size as f64 / MIB,
                self.max_file_size as f64 / MIB
            );
        }

        match FileKind::from_path(path) {
            FileKind::Text => match std::fs::read(path) {
                Ok(bytes) => format!(
                    "File '{}' content:\n{}\n# End of file content",
                    name,
                    String::from_utf8_lossy(&bytes)
                ),
                Err(e) => format!("Failed to read file '{}': {}", name, e),
            },
            FileKind::Image => format!(
                "This is an image file '{}'. Please analyze it based on its content.",
                name
            ),
            FileKind::Audio => format!(
                "This is an audio file '{}'. Please analyze it based on its content.",
                name
            ),
            FileKind::Document => match self.extractor.extract_text(path).await {
                Ok(text) => format!(
                    "Document '{}' extracted content:\n{}\n# End of document content",
                    name, text
                ),
                Err(e) => format!("Failed to extract document '{}': {}", name, e),
            },
            FileKind::Unsupported(ext) => format!("Unsupported file type: {}", ext),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeExtractor;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn normalizer(extractor: Arc<FakeExtractor>) -> InputNormalizer {
        InputNormalizer::new(extractor)
    }

    #[test]
    fn test_file_kind_is_case_insensitive() {
        assert_eq!(FileKind::from_path(Path::new("a.RS")), FileKind::Text);
        assert_eq!(FileKind::from_path(Path::new("photo.JPeG")), FileKind::Image);
        assert_eq!(FileKind::from_path(Path::new("song.flac")), FileKind::Audio);
        assert_eq!(FileKind::from_path(Path::new("deck.PPTX")), FileKind::Document);
        assert_eq!(
            FileKind::from_path(Path::new("tool.EXE")),
            FileKind::Unsupported(".exe".to_string())
        );
        assert_eq!(FileKind::from_path(Path::new("Makefile")), FileKind::Unsupported(String::new()));
    }

    #[tokio::test]
    async fn test_literal_text_and_files_keep_order() {
        let dir = TempDir::new().unwrap();
        let notes = dir.path().join("notes.md");
        std::fs::write(&notes, "# Notes\nremember").unwrap();

        let inputs = vec![
            "explain this".to_string(),
            notes.display().to_string(),
            "does-not-exist.txt".to_string(),
        ];
        let messages = normalizer(FakeExtractor::ok("")).normalize(&inputs).await;

        assert_eq!(
            messages,
            vec![
                Message::user("explain this"),
                Message::user("File 'notes.md' content:\n# Notes\nremember\n# End of file content"),
                Message::user("does-not-exist.txt"),
            ]
        );
    }

    #[tokio::test]
    async fn test_oversized_file_is_skipped_with_size() {
        let dir = TempDir::new().unwrap();
        let big = dir.path().join("big.txt");
        let file = std::fs::File::create(&big).unwrap();
        file.set_len(6 * 1024 * 1024).unwrap();

        let text = normalizer(FakeExtractor::ok("")).describe_file(&big).await;
        assert_eq!(text, "File 'big.txt' is too large (6.00 MiB > 5 MiB), skipped");
    }

    #[tokio::test]
    async fn test_media_files_get_prompts() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("cat.png");
        let audio = dir.path().join("talk.mp3");
        std::fs::write(&image, [0u8; 16]).unwrap();
        std::fs::write(&audio, [0u8; 16]).unwrap();

        let normalizer = normalizer(FakeExtractor::ok(""));
        assert_eq!(
            normalizer.describe_file(&image).await,
            "This is an image file 'cat.png'. Please analyze it based on its content."
        );
        assert_eq!(
            normalizer.describe_file(&audio).await,
            "This is an audio file 'talk.mp3'. Please analyze it based on its content."
        );
    }

    #[tokio::test]
    async fn test_document_uses_remote_extraction() {
        let dir = TempDir::new().unwrap();
        let pdf = dir.path().join("paper.pdf");
        std::fs::write(&pdf, b"%PDF-1.4").unwrap();

        let extractor = FakeExtractor::ok("abstract text");
        let text = normalizer(extractor.clone()).describe_file(&pdf).await;

        assert_eq!(text, "Document 'paper.pdf' extracted content:\nabstract text\n# End of document content");
        assert_eq!(extractor.calls(), 1);
    }

    #[tokio::test]
    async fn test_document_extraction_failure_is_inline() {
        let dir = TempDir::new().unwrap();
        let docx = dir.path().join("report.docx");
        std::fs::write(&docx, b"PK").unwrap();

        let text = normalizer(FakeExtractor::failing("upload rejected"))
            .describe_file(&docx)
            .await;
        assert_eq!(text, "Failed to extract document 'report.docx': API error: upload rejected");
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let bin = dir.path().join("a.out.bin");
        std::fs::write(&bin, [0u8; 4]).unwrap();

        let text = normalizer(FakeExtractor::ok("")).describe_file(&bin).await;
        assert_eq!(text, "Unsupported file type: .bin");
    }
}
