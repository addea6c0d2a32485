use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Anthropic,
    OpenAI,
    Google,
}

impl ProviderKind {
    /// Registration order. Provider selection walks this list.
    pub const ALL: [ProviderKind; 3] = [ProviderKind::Anthropic, ProviderKind::OpenAI, ProviderKind::Google];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAI => "openai",
            Self::Google => "google",
        }
    }

    pub fn env_vars(&self) -> &'static [&'static str] {
        match self {
            Self::Anthropic => &["ANTHROPIC_API_KEY"],
            Self::OpenAI => &["OPENAI_API_KEY"],
            Self::Google => &["GOOGLE_API_KEY", "GEMINI_API_KEY"],
        }
    }

    /// Accepts provider names as well as the common vendor/model aliases.
    pub fn from_alias(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Some(Self::Anthropic),
            "openai" | "gpt" => Some(Self::OpenAI),
            "google" | "gemini" => Some(Self::Google),
            _ => None,
        }
    }

    /// Guess the vendor from a model identifier such as `claude-3-5-haiku`.
    pub fn from_model_name(model: &str) -> Option<Self> {
        let lower = model.to_lowercase();
        if lower.contains("claude") {
            Some(Self::Anthropic)
        } else if lower.starts_with("gpt") || lower.starts_with("o1") || lower.starts_with("o3") || lower.starts_with("o4") {
            Some(Self::OpenAI)
        } else if lower.contains("gemini") {
            Some(Self::Google)
        } else {
            None
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityTier {
    Simple,
    Standard,
    Complex,
}

impl ComplexityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Standard => "standard",
            Self::Complex => "complex",
        }
    }
}

impl std::fmt::Display for ComplexityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelConfig {
    pub provider: ProviderKind,
    pub model_id: &'static str,
    /// USD per 1M prompt tokens
    pub cost_per_1m_input: f64,
    /// USD per 1M completion tokens
    pub cost_per_1m_output: f64,
    pub max_tokens: u32,
}

impl ModelConfig {
    pub fn cost(&self, prompt_tokens: u64, completion_tokens: u64) -> f64 {
        (prompt_tokens as f64 / 1_000_000.0) * self.cost_per_1m_input
            + (completion_tokens as f64 / 1_000_000.0) * self.cost_per_1m_output
    }
}

pub struct TierModels {
    pub tier: ComplexityTier,
    pub models: &'static [ModelConfig],
}

pub static MODEL_REGISTRY: &[TierModels] = &[
    TierModels {
        tier: ComplexityTier::Simple,
        models: &[
            ModelConfig { provider: ProviderKind::Anthropic, model_id: "claude-3-5-haiku-20241022", cost_per_1m_input: 0.8, cost_per_1m_output: 4.0, max_tokens: 8192 },
            ModelConfig { provider: ProviderKind::OpenAI, model_id: "gpt-4o-mini", cost_per_1m_input: 0.15, cost_per_1m_output: 0.6, max_tokens: 16384 },
            ModelConfig { provider: ProviderKind::Google, model_id: "gemini-2.0-flash", cost_per_1m_input: 0.1, cost_per_1m_output: 0.4, max_tokens: 8192 },
        ],
    },
    TierModels {
        tier: ComplexityTier::Standard,
        models: &[
            ModelConfig { provider: ProviderKind::Anthropic, model_id: "claude-sonnet-4-5-20250929", cost_per_1m_input: 3.0, cost_per_1m_output: 15.0, max_tokens: 16384 },
            ModelConfig { provider: ProviderKind::OpenAI, model_id: "gpt-4o", cost_per_1m_input: 2.5, cost_per_1m_output: 10.0, max_tokens: 16384 },
            ModelConfig { provider: ProviderKind::Google, model_id: "gemini-2.5-flash", cost_per_1m_input: 0.3, cost_per_1m_output: 2.5, max_tokens: 16384 },
        ],
    },
    TierModels {
        tier: ComplexityTier::Complex,
        models: &[
            ModelConfig { provider: ProviderKind::Anthropic, model_id: "claude-opus-4-1-20250805", cost_per_1m_input: 15.0, cost_per_1m_output: 75.0, max_tokens: 16384 },
            ModelConfig { provider: ProviderKind::OpenAI, model_id: "o3", cost_per_1m_input: 2.0, cost_per_1m_output: 8.0, max_tokens: 16384 },
            ModelConfig { provider: ProviderKind::Google, model_id: "gemini-2.5-pro", cost_per_1m_input: 1.25, cost_per_1m_output: 10.0, max_tokens: 16384 },
        ],
    },
];

pub fn models_for_tier(tier: ComplexityTier) -> &'static [ModelConfig] {
    MODEL_REGISTRY.iter()
        .find(|t| t.tier == tier)
        .map(|t| t.models)
        .unwrap_or(&[])
}

/// First model registered for `(tier, provider)`; otherwise the tier's first
/// model regardless of provider.
pub fn select_model(tier: ComplexityTier, provider: ProviderKind) -> Option<&'static ModelConfig> {
    let models = models_for_tier(tier);
    models.iter()
        .find(|m| m.provider == provider)
        .or_else(|| models.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_tier_has_models() {
        for tier in [ComplexityTier::Simple, ComplexityTier::Standard, ComplexityTier::Complex] {
            assert!(!models_for_tier(tier).is_empty(), "tier {} empty", tier);
        }
    }

    #[test]
    fn test_select_model_matches_provider() {
        let m = select_model(ComplexityTier::Simple, ProviderKind::OpenAI).unwrap();
        assert_eq!(m.model_id, "gpt-4o-mini");
        assert_eq!(m.provider, ProviderKind::OpenAI);
    }

    #[test]
    fn test_cost_formula() {
        let m = select_model(ComplexityTier::Standard, ProviderKind::Anthropic).unwrap();
        let cost = m.cost(1_000_000, 500_000);
        assert!((cost - (3.0 + 7.5)).abs() < 1e-9);
    }

    #[test]
    fn test_provider_aliases() {
        assert_eq!(ProviderKind::from_alias("Claude"), Some(ProviderKind::Anthropic));
        assert_eq!(ProviderKind::from_alias("gemini"), Some(ProviderKind::Google));
        assert_eq!(ProviderKind::from_alias("openai"), Some(ProviderKind::OpenAI));
        assert_eq!(ProviderKind::from_alias("mistral"), None);
    }

    #[test]
    fn test_provider_from_model_name() {
        assert_eq!(ProviderKind::from_model_name("claude-3-opus"), Some(ProviderKind::Anthropic));
        assert_eq!(ProviderKind::from_model_name("gpt-4o-mini"), Some(ProviderKind::OpenAI));
        assert_eq!(ProviderKind::from_model_name("gemini-2.0-flash"), Some(ProviderKind::Google));
        assert_eq!(ProviderKind::from_model_name("llama3"), None);
    }

    #[test]
    fn test_tier_serialization() {
        let json = serde_json::to_string(&ComplexityTier::Complex).unwrap();
        assert_eq!(json, "\"complex\"");
    }
}
