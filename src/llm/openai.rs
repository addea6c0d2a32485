use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use crate::errors::FlowError;
use super::catalog::ProviderKind;
use super::provider::LLMProvider;
use super::types::{CompletionRequest, LLMResponse};

pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIProvider {
    pub fn new(api_key: &str, base_url: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.unwrap_or("https://api.openai.com/v1").trim_end_matches('/').to_string(),
        }
    }
}

/// Reasoning models reject `max_tokens` and custom temperatures.
fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("o1") || model.starts_with("o3") || model.starts_with("o4")
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<LLMResponse, FlowError> {
        let messages: Vec<Value> = request.messages.iter()
            .map(|m| json!({"role": m.role, "content": m.content}))
            .collect();

        let body = if is_reasoning_model(&request.model) {
            json!({
                "model": request.model,
                "messages": messages,
                "max_completion_tokens": request.max_tokens,
            })
        } else {
            json!({
                "model": request.model,
                "messages": messages,
                "max_tokens": request.max_tokens,
                "temperature": request.temperature,
            })
        };

        let resp = self.client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| FlowError::Network(format!("OpenAI request failed: {}", e)))?;

        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(FlowError::RateLimit("OpenAI rate limit".into()));
        }
        if status.as_u16() == 401 {
            return Err(FlowError::Authentication("Invalid OpenAI API key".into()));
        }

        let data: Value = resp.json().await
            .map_err(|e| FlowError::LLMApi(format!("Failed to parse OpenAI response: {}", e)))?;

        if let Some(error) = data.get("error") {
            return Err(FlowError::LLMApi(error["message"].as_str().unwrap_or("Unknown").to_string()));
        }

        let content = data["choices"][0]["message"]["content"].as_str()
            .ok_or_else(|| FlowError::LLMApi("No content in OpenAI response".into()))?
            .to_string();
        let prompt_tokens = data["usage"]["prompt_tokens"].as_u64().unwrap_or(0);
        let completion_tokens = data["usage"]["completion_tokens"].as_u64().unwrap_or(0);

        Ok(LLMResponse {
            content,
            prompt_tokens,
            completion_tokens,
            model: request.model.clone(),
        })
    }

    fn provider_kind(&self) -> ProviderKind { ProviderKind::OpenAI }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reasoning_model_detection() {
        assert!(is_reasoning_model("o3"));
        assert!(is_reasoning_model("o4-mini"));
        assert!(!is_reasoning_model("gpt-4o"));
    }
}
