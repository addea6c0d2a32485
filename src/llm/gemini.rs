use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use crate::errors::FlowError;
use super::catalog::ProviderKind;
use super::provider::LLMProvider;
use super::types::{CompletionRequest, LLMResponse};

pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: &str, base_url: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url
                .unwrap_or("https://generativelanguage.googleapis.com/v1beta")
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<LLMResponse, FlowError> {
        // Gemini has no assistant role; it calls it "model".
        let contents: Vec<Value> = request.messages.iter()
            .filter(|m| !m.is_system())
            .map(|m| {
                let role = if m.role == "assistant" { "model" } else { "user" };
                json!({"role": role, "parts": [{"text": m.content}]})
            })
            .collect();

        let mut body = json!({
            "contents": contents,
            "generationConfig": {
                "maxOutputTokens": request.max_tokens,
                "temperature": request.temperature,
            }
        });
        if let Some(sys) = request.system_text() {
            body["systemInstruction"] = json!({"parts": [{"text": sys}]});
        }

        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);

        let resp = self.client.post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| FlowError::Network(format!("Gemini request failed: {}", e)))?;

        match resp.status().as_u16() {
            429 => return Err(FlowError::RateLimit("Gemini rate limit".into())),
            401 | 403 => return Err(FlowError::Authentication("Invalid Google API key".into())),
            _ => {}
        }

        let data: Value = resp.json().await
            .map_err(|e| FlowError::LLMApi(format!("Parse error: {}", e)))?;

        if let Some(error) = data.get("error") {
            return Err(FlowError::LLMApi(error["message"].as_str().unwrap_or("Unknown").to_string()));
        }

        let content = data["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| FlowError::LLMApi("No content in Gemini response".into()))?
            .to_string();

        let prompt_tokens = data["usageMetadata"]["promptTokenCount"].as_u64().unwrap_or(0);
        let completion_tokens = data["usageMetadata"]["candidatesTokenCount"].as_u64().unwrap_or(0);

        Ok(LLMResponse {
            content,
            prompt_tokens,
            completion_tokens,
            model: request.model.clone(),
        })
    }

    fn provider_kind(&self) -> ProviderKind { ProviderKind::Google }
}
