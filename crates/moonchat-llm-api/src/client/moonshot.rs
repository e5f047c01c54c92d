use async_trait::async_trait;
use colored::Colorize;
use futures_util::StreamExt;
use moonchat_logging::{log_request, log_request_to_file, log_response, log_stream_chunk};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::client::stream::{SseEvent, SseParser};
use crate::client::{CompletionBackend, CompletionError, CompletionRequest, FileExtractor};
use crate::config::{chat_completions_url, file_content_url, file_url, files_url, normalize_api_base};

/// Uploaded file handle returned by the files endpoint
#[derive(Debug, Deserialize)]
struct FileObject {
    id: String,
}

/// Moonshot (OpenAI-compatible) client: streamed chat completions and file extraction
pub struct MoonshotClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
    verbose: bool,
    request_log_dir: Option<PathBuf>,
}

impl MoonshotClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url: normalize_api_base(&base_url),
            client: reqwest::Client::new(),
            verbose: false,
            request_log_dir: None,
        }
    }

    /// Print request, response and stream chunk diagnostics
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Dump every chat request into this directory
    pub fn with_request_log_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.request_log_dir = dir;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Turn a non-2xx response into a `Status` error carrying the body
    async fn ensure_success(&self, response: reqwest::Response) -> Result<reqwest::Response, CompletionError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error body".to_string());
        log_response(&status, &headers, &body, self.verbose);

        Err(CompletionError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn upload_for_extraction(&self, path: &Path) -> Result<FileObject, CompletionError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());

        let form = reqwest::multipart::Form::new()
            .text("purpose", "file-extract")
            .part("file", reqwest::multipart::Part::bytes(bytes).file_name(file_name));

        let response = self
            .client
            .post(files_url(&self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        Ok(self.ensure_success(response).await?.json::<FileObject>().await?)
    }

    async fn retrieve_content(&self, file_id: &str) -> Result<String, CompletionError> {
        let response = self
            .client
            .get(file_content_url(&self.base_url, file_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let body = self.ensure_success(response).await?.text().await?;

        // The provider wraps the text in a JSON document; fall back to the raw body
        let content = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| value.get("content").and_then(|c| c.as_str()).map(ToString::to_string))
            .unwrap_or(body);

        Ok(content)
    }

    async fn delete_file(&self, file_id: &str) -> Result<(), CompletionError> {
        let response = self
            .client
            .delete(file_url(&self.base_url, file_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        self.ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl CompletionBackend for MoonshotClient {
    async fn stream_chat(
        &self,
        request: &CompletionRequest<'_>,
        sink: &mut (dyn for<'d> FnMut(&'d str) + Send),
    ) -> Result<String, CompletionError> {
        let api_url = chat_completions_url(&self.base_url);

        log_request(&api_url, request, &self.api_key, self.verbose);

        if let Some(dir) = &self.request_log_dir {
            match log_request_to_file(dir, &api_url, request, request.model, &self.api_key) {
                Ok(path) if self.verbose => {
                    println!("{}", format!("📝 Request logged to: {}", path.display()).bright_blue());
                }
                Ok(_) => {}
                Err(e) => eprintln!("{} {}", "[Logging error]".yellow(), e),
            }
        }

        let response = self
            .client
            .post(&api_url)
            .bearer_auth(&self.api_key)
            .header("Accept", "text/event-stream")
            .json(request)
            .send()
            .await?;
        let response = self.ensure_success(response).await?;

        let mut parser = SseParser::default();
        let mut accumulated = String::new();
        let mut chunk_counter = 0;
        let mut stream = response.bytes_stream();

        'stream: while let Some(chunk_result) = stream.next().await {
            let bytes = chunk_result?;
            for event in parser.feed(&bytes)? {
                chunk_counter += 1;
                match event {
                    SseEvent::Done => {
                        log_stream_chunk(chunk_counter, "[DONE]", self.verbose);
                        break 'stream;
                    }
                    SseEvent::Delta(delta) => {
                        log_stream_chunk(chunk_counter, &delta, self.verbose);
                        if !delta.is_empty() {
                            sink(&delta);
                            accumulated.push_str(&delta);
                        }
                    }
                }
            }
        }

        for event in parser.finish()? {
            if let SseEvent::Delta(delta) = event {
                if !delta.is_empty() {
                    sink(&delta);
                    accumulated.push_str(&delta);
                }
            }
        }

        Ok(accumulated)
    }
}

#[async_trait]
impl FileExtractor for MoonshotClient {
    async fn extract_text(&self, path: &Path) -> Result<String, CompletionError> {
        let uploaded = self.upload_for_extraction(path).await?;
        let content = self.retrieve_content(&uploaded.id).await;

        // The remote copy is removed even when retrieval failed
        if let Err(e) = self.delete_file(&uploaded.id).await {
            eprintln!("{} Failed to delete remote file {}: {}", "⚠️".yellow(), uploaded.id, e);
        }

        content
    }
}
