use serde::{Deserialize, Serialize};
use super::catalog::{ComplexityTier, ProviderKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: &str) -> Self {
        Self { role: "system".to_string(), content: content.to_string() }
    }
    pub fn user(content: &str) -> Self {
        Self { role: "user".to_string(), content: content.to_string() }
    }
    pub fn assistant(content: &str) -> Self {
        Self { role: "assistant".to_string(), content: content.to_string() }
    }

    pub fn is_system(&self) -> bool {
        self.role == "system"
    }

    pub fn is_user(&self) -> bool {
        self.role == "user"
    }
}

/// What a provider client is asked to do: one model, one message list.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    /// Concatenated system messages, for APIs that take the system prompt separately.
    pub fn system_text(&self) -> Option<String> {
        let parts: Vec<&str> = self.messages.iter()
            .filter(|m| m.is_system())
            .map(|m| m.content.as_str())
            .collect();
        if parts.is_empty() { None } else { Some(parts.join("\n\n")) }
    }
}

/// Raw provider answer, before pricing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMResponse {
    pub content: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub model: String,
}

/// Router output: the provider answer priced against the selected model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResult {
    pub content: String,
    pub provider: ProviderKind,
    pub model: String,
    pub tier: ComplexityTier,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub cost_usd: f64,
    pub latency_ms: u64,
}

impl CompletionResult {
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_text_joins_system_messages() {
        let req = CompletionRequest {
            model: "m".into(),
            messages: vec![
                Message::system("a"),
                Message::user("hello"),
                Message::system("b"),
            ],
            max_tokens: 10,
            temperature: 0.5,
        };
        assert_eq!(req.system_text().as_deref(), Some("a\n\nb"));
    }

    #[test]
    fn test_system_text_none_without_system() {
        let req = CompletionRequest {
            model: "m".into(),
            messages: vec![Message::user("hello")],
            max_tokens: 10,
            temperature: 0.5,
        };
        assert!(req.system_text().is_none());
    }
}
