use std::sync::Arc;
use std::time::Instant;
use crate::config::credentials::{redact_credentials, CredentialMode, Credentials, ProviderCredential};
use crate::errors::FlowError;
use super::anthropic::AnthropicProvider;
use super::catalog::{self, ComplexityTier, ProviderKind};
use super::gemini::GeminiProvider;
use super::openai::OpenAIProvider;
use super::provider::LLMProvider;
use super::telemetry::{self, RoutingDecision, TelemetrySink};
use super::tier::classify_messages;
use super::types::{CompletionRequest, CompletionResult, Message};
use tracing::{debug, info};

pub fn create_provider(credential: &ProviderCredential) -> Box<dyn LLMProvider> {
    let base_url = credential.base_url.as_deref();
    match credential.provider {
        ProviderKind::Anthropic => Box::new(AnthropicProvider::new(&credential.api_key, base_url)),
        ProviderKind::OpenAI => Box::new(OpenAIProvider::new(&credential.api_key, base_url)),
        ProviderKind::Google => Box::new(GeminiProvider::new(&credential.api_key, base_url)),
    }
}

/// Inputs to one routed completion.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub messages: Vec<Message>,
    /// Classified from the user text when absent
    pub tier: Option<ComplexityTier>,
    pub preferred_provider: Option<ProviderKind>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl RouteRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            tier: None,
            preferred_provider: None,
            max_tokens: 4096,
            temperature: 0.7,
        }
    }
}

/// Picks a provider and model per request, prices the answer and reports the
/// decision. Read-only after construction, so one router can serve many runs.
pub struct CompletionRouter {
    mode: CredentialMode,
    clients: Vec<Arc<dyn LLMProvider>>,
    telemetry: Option<Arc<dyn TelemetrySink>>,
    secrets: Vec<String>,
}

impl CompletionRouter {
    /// One client per provider that has a key. In scoped mode only the
    /// caller's keys exist, so an empty map yields a router with no clients.
    pub fn from_credentials(credentials: &Credentials) -> Self {
        let clients = credentials.entries().iter()
            .map(|c| -> Arc<dyn LLMProvider> { Arc::from(create_provider(c)) })
            .collect();
        let secrets = credentials.secrets().into_iter().map(str::to_string).collect();
        Self { mode: credentials.mode(), clients, telemetry: None, secrets }
    }

    /// Router over pre-built clients, kept in the given order.
    pub fn with_clients(mode: CredentialMode, clients: Vec<Arc<dyn LLMProvider>>) -> Self {
        Self { mode, clients, telemetry: None, secrets: Vec::new() }
    }

    pub fn with_telemetry(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = Some(sink);
        self
    }

    pub fn mode(&self) -> CredentialMode {
        self.mode
    }

    /// Mask every key this router holds.
    pub fn redact(&self, text: &str) -> String {
        let secrets: Vec<&str> = self.secrets.iter().map(String::as_str).collect();
        redact_credentials(text, &secrets)
    }

    pub fn providers(&self) -> Vec<ProviderKind> {
        self.clients.iter().map(|c| c.provider_kind()).collect()
    }

    /// The preferred provider when it has a client, else the first registered one.
    pub fn select_provider(&self, preferred: Option<ProviderKind>) -> Result<&Arc<dyn LLMProvider>, FlowError> {
        if let Some(kind) = preferred {
            if let Some(client) = self.clients.iter().find(|c| c.provider_kind() == kind) {
                return Ok(client);
            }
            debug!(preferred = %kind, "Preferred provider has no credentials, falling back");
        }
        self.clients.first().ok_or_else(|| {
            let scope = match self.mode {
                CredentialMode::Shared => "no shared provider credentials are set",
                CredentialMode::Scoped => "no credentials were supplied for this caller",
            };
            FlowError::NoProvider(scope.to_string())
        })
    }

    pub async fn complete(&self, request: RouteRequest) -> Result<CompletionResult, FlowError> {
        let tier = request.tier.unwrap_or_else(|| classify_messages(&request.messages));
        let client = self.select_provider(request.preferred_provider)?;
        let provider = client.provider_kind();

        let model = catalog::select_model(tier, provider)
            .ok_or_else(|| FlowError::Config(format!("No model registered for tier {}", tier)))?;
        if model.provider != provider {
            debug!(tier = %tier, provider = %provider, model = model.model_id, "Using cross-provider model fallback");
        }

        let provider_request = CompletionRequest {
            model: model.model_id.to_string(),
            messages: request.messages,
            max_tokens: request.max_tokens.clamp(1, model.max_tokens),
            temperature: request.temperature,
        };

        let start = Instant::now();
        let response = client.complete(&provider_request).await?;
        let latency_ms = start.elapsed().as_millis() as u64;

        let cost_usd = model.cost(response.prompt_tokens, response.completion_tokens);

        info!(
            provider = %provider,
            model = model.model_id,
            tier = %tier,
            latency_ms,
            prompt_tokens = response.prompt_tokens,
            completion_tokens = response.completion_tokens,
            cost_usd,
            "Completion routed"
        );

        if let Some(sink) = &self.telemetry {
            telemetry::report(sink, RoutingDecision {
                provider,
                model: model.model_id.to_string(),
                tier,
                latency_ms,
                prompt_tokens: response.prompt_tokens,
                completion_tokens: response.completion_tokens,
                cost_usd,
            });
        }

        Ok(CompletionResult {
            content: response.content,
            provider,
            model: model.model_id.to_string(),
            tier,
            prompt_tokens: response.prompt_tokens,
            completion_tokens: response.completion_tokens,
            cost_usd,
            latency_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockProvider;
    use std::collections::HashMap;

    fn router(clients: Vec<Arc<dyn LLMProvider>>) -> CompletionRouter {
        CompletionRouter::with_clients(CredentialMode::Shared, clients)
    }

    #[tokio::test]
    async fn test_scoped_empty_map_fails_no_provider() {
        let router = CompletionRouter::from_credentials(&Credentials::scoped(HashMap::new()));
        assert!(router.providers().is_empty());
        let err = router.complete(RouteRequest::new(vec![Message::user("hi")])).await.unwrap_err();
        assert!(matches!(err, FlowError::NoProvider(_)));
        assert!(err.to_string().contains("No provider configured"));
    }

    #[tokio::test]
    async fn test_scoped_builds_only_supplied_clients() {
        let mut keys = HashMap::new();
        keys.insert("openai".to_string(), "sk-test".to_string());
        let router = CompletionRouter::from_credentials(&Credentials::scoped(keys));
        assert_eq!(router.providers(), vec![ProviderKind::OpenAI]);
        assert_eq!(router.mode(), CredentialMode::Scoped);
    }

    #[test]
    fn test_redacts_held_keys() {
        let mut keys = HashMap::new();
        keys.insert("claude".to_string(), "sk-ant-secret-123".to_string());
        let router = CompletionRouter::from_credentials(&Credentials::scoped(keys));
        assert_eq!(router.redact("bad key sk-ant-secret-123"), "bad key [REDACTED]");
    }

    #[tokio::test]
    async fn test_prefers_explicit_provider() {
        let anthropic = Arc::new(MockProvider::new(ProviderKind::Anthropic).respond("from anthropic", 10, 5));
        let google = Arc::new(MockProvider::new(ProviderKind::Google).respond("from google", 10, 5));
        let router = router(vec![anthropic.clone(), google.clone()]);

        let mut req = RouteRequest::new(vec![Message::user("hi")]);
        req.preferred_provider = Some(ProviderKind::Google);
        let result = router.complete(req).await.unwrap();
        assert_eq!(result.provider, ProviderKind::Google);
        assert_eq!(result.content, "from google");
        assert_eq!(anthropic.calls(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_preference_uses_first_registered() {
        let openai = Arc::new(MockProvider::new(ProviderKind::OpenAI).respond("ok", 1, 1));
        let router = router(vec![openai]);
        let mut req = RouteRequest::new(vec![Message::user("hi")]);
        req.preferred_provider = Some(ProviderKind::Anthropic);
        let result = router.complete(req).await.unwrap();
        assert_eq!(result.provider, ProviderKind::OpenAI);
    }

    #[tokio::test]
    async fn test_model_selected_by_tier_and_priced() {
        let openai = Arc::new(MockProvider::new(ProviderKind::OpenAI).respond("ok", 2_000_000, 1_000_000));
        let router = router(vec![openai.clone()]);
        let mut req = RouteRequest::new(vec![Message::user("hi")]);
        req.tier = Some(ComplexityTier::Simple);
        let result = router.complete(req).await.unwrap();
        assert_eq!(result.model, "gpt-4o-mini");
        assert_eq!(openai.last_request().unwrap().model, "gpt-4o-mini");
        // 2M * 0.15 + 1M * 0.6
        assert!((result.cost_usd - 0.9).abs() < 1e-9);
        assert_eq!(result.total_tokens(), 3_000_000);
    }

    #[tokio::test]
    async fn test_tier_classified_when_absent() {
        let client = Arc::new(MockProvider::new(ProviderKind::Anthropic).respond("ok", 1, 1));
        let router = router(vec![client]);
        let req = RouteRequest::new(vec![Message::user("Analyze the system architecture")]);
        let result = router.complete(req).await.unwrap();
        assert_eq!(result.tier, ComplexityTier::Complex);
        assert_eq!(result.model, "claude-opus-4-1-20250805");
    }

    #[tokio::test]
    async fn test_max_tokens_clamped_to_model() {
        let client = Arc::new(MockProvider::new(ProviderKind::Anthropic).respond("ok", 1, 1));
        let router = router(vec![client.clone()]);
        let mut req = RouteRequest::new(vec![Message::user("hi")]);
        req.tier = Some(ComplexityTier::Simple);
        req.max_tokens = 100_000;
        router.complete(req).await.unwrap();
        assert_eq!(client.last_request().unwrap().max_tokens, 8192);
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let client = Arc::new(MockProvider::new(ProviderKind::OpenAI).fail_with(|| FlowError::RateLimit("slow down".into())));
        let router = router(vec![client]);
        let err = router.complete(RouteRequest::new(vec![Message::user("hi")])).await.unwrap_err();
        assert!(matches!(err, FlowError::RateLimit(_)));
    }
}
