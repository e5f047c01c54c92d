//! In-memory stand-ins for the completion provider used by unit tests

use async_trait::async_trait;
use moonchat_llm_api::{CompletionBackend, CompletionError, CompletionRequest, FileExtractor};
use moonchat_types::Message;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Replays scripted results and remembers every request it was sent
pub struct FakeBackend {
    script: Mutex<VecDeque<Result<String, CompletionError>>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl FakeBackend {
    pub fn new(script: Vec<Result<String, CompletionError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn answering(answers: &[&str]) -> Arc<Self> {
        Self::new(answers.iter().map(|a| Ok(a.to_string())).collect())
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Vec<Message> {
        self.requests.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl CompletionBackend for FakeBackend {
    async fn stream_chat(
        &self,
        request: &CompletionRequest<'_>,
        sink: &mut (dyn for<'d> FnMut(&'d str) + Send),
    ) -> Result<String, CompletionError> {
        self.requests.lock().unwrap().push(request.messages.to_vec());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => {
                sink(&text);
                Ok(text)
            }
            Some(Err(e)) => Err(e),
            None => Err(CompletionError::Api("no scripted answer left".to_string())),
        }
    }
}

/// Extractor returning a fixed text or a fixed error
pub struct FakeExtractor {
    result: Result<String, String>,
    calls: AtomicUsize,
}

impl FakeExtractor {
    pub fn ok(text: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileExtractor for FakeExtractor {
    async fn extract_text(&self, _path: &Path) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone().map_err(CompletionError::Api)
    }
}
