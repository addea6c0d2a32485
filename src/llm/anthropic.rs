use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use crate::errors::FlowError;
use super::catalog::ProviderKind;
use super::provider::LLMProvider;
use super::types::{CompletionRequest, LLMResponse};
use tracing::debug;

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(api_key: &str, base_url: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.unwrap_or("https://api.anthropic.com").trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<LLMResponse, FlowError> {
        let messages: Vec<Value> = request.messages.iter()
            .filter(|m| !m.is_system())
            .map(|m| json!({"role": m.role, "content": m.content}))
            .collect();

        let mut body = json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "messages": messages,
        });

        if let Some(sys) = request.system_text() {
            body["system"] = json!(sys);
        }

        let resp = self.client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| FlowError::Network(format!("Anthropic API request failed: {}", e)))?;

        let status = resp.status();
        if status == 429 {
            return Err(FlowError::RateLimit("Anthropic rate limit exceeded".into()));
        }
        if status == 401 {
            return Err(FlowError::Authentication("Invalid Anthropic API key".into()));
        }

        let data: Value = resp.json().await
            .map_err(|e| FlowError::LLMApi(format!("Failed to parse Anthropic response: {}", e)))?;

        if let Some(error) = data.get("error") {
            let msg = error["message"].as_str().unwrap_or("Unknown error");
            if msg.contains("billing") || msg.contains("credit") {
                return Err(FlowError::Billing(msg.to_string()));
            }
            return Err(FlowError::LLMApi(msg.to_string()));
        }

        let content = data["content"][0]["text"].as_str()
            .ok_or_else(|| FlowError::LLMApi("No content in Anthropic response".into()))?
            .to_string();

        let prompt_tokens = data["usage"]["input_tokens"].as_u64().unwrap_or(0);
        let completion_tokens = data["usage"]["output_tokens"].as_u64().unwrap_or(0);

        debug!(model = %request.model, prompt_tokens, completion_tokens, "Anthropic completion");

        Ok(LLMResponse {
            content,
            prompt_tokens,
            completion_tokens,
            model: request.model.clone(),
        })
    }

    fn provider_kind(&self) -> ProviderKind { ProviderKind::Anthropic }
}
