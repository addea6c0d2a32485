//! Scripted in-process provider for tests and dry runs.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use async_trait::async_trait;
use crate::errors::FlowError;
use super::catalog::ProviderKind;
use super::provider::LLMProvider;
use super::types::{CompletionRequest, LLMResponse};

type Handler = Arc<dyn Fn(&CompletionRequest, u32) -> Result<LLMResponse, FlowError> + Send + Sync>;

pub struct MockProvider {
    kind: ProviderKind,
    handler: Handler,
    delay: Option<Duration>,
    calls: AtomicU32,
    requests: Mutex<Vec<CompletionRequest>>,
    call_times: Mutex<Vec<Instant>>,
}

impl MockProvider {
    /// Answers "ok" with zero usage until configured otherwise.
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            handler: Arc::new(|req, _| Ok(reply("ok", 0, 0, &req.model))),
            delay: None,
            calls: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
            call_times: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(self, content: &str, prompt_tokens: u64, completion_tokens: u64) -> Self {
        let content = content.to_string();
        self.with_handler(move |req, _| Ok(reply(&content, prompt_tokens, completion_tokens, &req.model)))
    }

    pub fn fail_with(self, make_error: impl Fn() -> FlowError + Send + Sync + 'static) -> Self {
        self.with_handler(move |_, _| Err(make_error()))
    }

    /// `handler(request, call_index)`; `call_index` starts at 0.
    pub fn with_handler(
        mut self,
        handler: impl Fn(&CompletionRequest, u32) -> Result<LLMResponse, FlowError> + Send + Sync + 'static,
    ) -> Self {
        self.handler = Arc::new(handler);
        self
    }

    /// Sleep before answering every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests().pop()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().map(|t| t.clone()).unwrap_or_default()
    }
}

/// Build a provider answer with the given usage.
pub fn reply(content: &str, prompt_tokens: u64, completion_tokens: u64, model: &str) -> LLMResponse {
    LLMResponse {
        content: content.to_string(),
        prompt_tokens,
        completion_tokens,
        model: model.to_string(),
    }
}

#[async_trait]
impl LLMProvider for MockProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<LLMResponse, FlowError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut times) = self.call_times.lock() {
            times.push(Instant::now());
        }
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.handler)(request, index)
    }

    fn provider_kind(&self) -> ProviderKind { self.kind }
}
