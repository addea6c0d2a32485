use std::collections::HashMap;
use crate::llm::catalog::ProviderKind;
use super::types::FlowConfig;
use tracing::{debug, warn};

/// Resolve a credential value. If the value starts with '$', treat it as an
/// environment variable reference and resolve from the environment.
pub fn resolve_credential(value: &str) -> String {
    if let Some(var_name) = value.strip_prefix('$') {
        match std::env::var(var_name) {
            Ok(resolved) => {
                debug!(var = %var_name, "Resolved credential from environment");
                resolved
            }
            Err(_) => {
                debug!(var = %var_name, "Environment variable not set, using literal");
                value.to_string()
            }
        }
    } else {
        value.to_string()
    }
}

/// Redact sensitive values in a string. Replaces known credential patterns
/// with [REDACTED].
pub fn redact_credentials(text: &str, secrets: &[&str]) -> String {
    let mut result = text.to_string();
    for secret in secrets {
        if !secret.is_empty() && secret.len() >= 4 {
            result = result.replace(secret, "[REDACTED]");
        }
    }
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode {
    /// Process-wide keys from config and environment
    Shared,
    /// Only keys the caller handed in
    Scoped,
}

#[derive(Clone)]
pub struct ProviderCredential {
    pub provider: ProviderKind,
    pub api_key: String,
    pub base_url: Option<String>,
}

impl std::fmt::Debug for ProviderCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredential")
            .field("provider", &self.provider)
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Provider keys in registration order.
#[derive(Debug, Clone)]
pub struct Credentials {
    mode: CredentialMode,
    entries: Vec<ProviderCredential>,
}

impl Credentials {
    /// Keys from config first, then the provider's well-known environment variables.
    pub fn shared(config: &FlowConfig) -> Self {
        let mut entries = Vec::new();
        for kind in ProviderKind::ALL {
            let settings = config.providers.get(kind);
            let from_config = settings
                .and_then(|s| s.api_key.as_deref())
                .map(resolve_credential)
                .filter(|k| !k.is_empty() && !k.starts_with('$'));
            let api_key = from_config.or_else(|| {
                kind.env_vars().iter()
                    .find_map(|var| std::env::var(var).ok())
                    .filter(|k| !k.is_empty())
            });
            if let Some(api_key) = api_key {
                entries.push(ProviderCredential {
                    provider: kind,
                    api_key,
                    base_url: settings.and_then(|s| s.base_url.clone()),
                });
            }
        }
        Self { mode: CredentialMode::Shared, entries }
    }

    /// Caller-supplied keys only (bring-your-own-key). Never consults config or environment.
    pub fn scoped(keys: HashMap<String, String>) -> Self {
        let mut entries = Vec::new();
        for kind in ProviderKind::ALL {
            // The canonical name wins over aliases, then the smallest name.
            let key = keys.iter()
                .filter(|(name, value)| ProviderKind::from_alias(name) == Some(kind) && !value.is_empty())
                .min_by_key(|&(name, _)| (name.trim().to_lowercase() != kind.as_str(), name.as_str()))
                .map(|(_, value)| value.clone());
            if let Some(api_key) = key {
                entries.push(ProviderCredential { provider: kind, api_key, base_url: None });
            }
        }
        for name in keys.keys() {
            if ProviderKind::from_alias(name).is_none() {
                warn!(provider = %name, "Ignoring credential for unknown provider");
            }
        }
        Self { mode: CredentialMode::Scoped, entries }
    }

    /// Keep only the given provider's key.
    pub fn restrict_to(mut self, kind: ProviderKind) -> Self {
        self.entries.retain(|e| e.provider == kind);
        self
    }

    pub fn mode(&self) -> CredentialMode {
        self.mode
    }

    pub fn entries(&self) -> &[ProviderCredential] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn secrets(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.api_key.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{ProviderSettings, ProvidersConfig};

    #[test]
    fn test_resolve_credential_literal() {
        assert_eq!(resolve_credential("mypassword"), "mypassword");
    }

    #[test]
    fn test_resolve_credential_env_var() {
        std::env::set_var("TEST_AGENTFLOW_CRED", "secret123");
        assert_eq!(resolve_credential("$TEST_AGENTFLOW_CRED"), "secret123");
        std::env::remove_var("TEST_AGENTFLOW_CRED");
    }

    #[test]
    fn test_resolve_credential_missing_env_var() {
        let result = resolve_credential("$NONEXISTENT_AGENTFLOW_VAR");
        assert_eq!(result, "$NONEXISTENT_AGENTFLOW_VAR");
    }

    #[test]
    fn test_redact_credentials() {
        let text = "request failed for key sk-abcdef123 and id=abc";
        let redacted = redact_credentials(text, &["sk-abcdef123", "abc"]);
        assert!(redacted.contains("[REDACTED]"));
        assert!(!redacted.contains("sk-abcdef123"));
    }

    #[test]
    fn test_redact_credentials_short_secret_ignored() {
        let text = "key=ab";
        let redacted = redact_credentials(text, &["ab"]);
        assert_eq!(redacted, "key=ab");
    }

    #[test]
    fn test_scoped_prefers_canonical_name_over_alias() {
        for _ in 0..8 {
            let mut keys = HashMap::new();
            keys.insert("claude".to_string(), "sk-alias".to_string());
            keys.insert("Anthropic".to_string(), "sk-canonical".to_string());
            keys.insert("gemini".to_string(), "g-alias".to_string());
            keys.insert("GEMINI ".to_string(), "g-upper".to_string());
            let creds = Credentials::scoped(keys);
            assert_eq!(creds.entries()[0].api_key, "sk-canonical");
            assert_eq!(creds.entries()[1].provider, ProviderKind::Google);
            assert_eq!(creds.entries()[1].api_key, "g-upper");
            assert_eq!(creds.entries().len(), 2);
        }
    }

    #[test]
    fn test_scoped_empty_has_no_entries() {
        let creds = Credentials::scoped(HashMap::new());
        assert!(creds.is_empty());
        assert_eq!(creds.mode(), CredentialMode::Scoped);
    }

    #[test]
    fn test_scoped_normalises_aliases_in_registration_order() {
        let mut keys = HashMap::new();
        keys.insert("gemini".to_string(), "g-key".to_string());
        keys.insert("claude".to_string(), "a-key".to_string());
        keys.insert("mistral".to_string(), "m-key".to_string());
        keys.insert("openai".to_string(), String::new());
        let creds = Credentials::scoped(keys);
        let kinds: Vec<ProviderKind> = creds.entries().iter().map(|e| e.provider).collect();
        assert_eq!(kinds, vec![ProviderKind::Anthropic, ProviderKind::Google]);
    }

    #[test]
    fn test_shared_reads_config_keys() {
        let config = FlowConfig {
            providers: ProvidersConfig {
                openai: Some(ProviderSettings {
                    api_key: Some("sk-config".into()),
                    base_url: Some("http://localhost:9999/v1".into()),
                }),
                ..Default::default()
            },
            ..Default::default()
        };
        let creds = Credentials::shared(&config);
        let openai = creds.entries().iter().find(|e| e.provider == ProviderKind::OpenAI).unwrap();
        assert_eq!(openai.api_key, "sk-config");
        assert_eq!(openai.base_url.as_deref(), Some("http://localhost:9999/v1"));
        assert_eq!(creds.mode(), CredentialMode::Shared);
    }

    #[test]
    fn test_restrict_to_single_provider() {
        let mut keys = HashMap::new();
        keys.insert("anthropic".to_string(), "a-key".to_string());
        keys.insert("openai".to_string(), "o-key".to_string());
        let creds = Credentials::scoped(keys).restrict_to(ProviderKind::OpenAI);
        assert_eq!(creds.entries().len(), 1);
        assert_eq!(creds.secrets(), vec!["o-key"]);
    }

    #[test]
    fn test_debug_hides_key() {
        let cred = ProviderCredential {
            provider: ProviderKind::Anthropic,
            api_key: "sk-ant-secret".into(),
            base_url: None,
        };
        let printed = format!("{:?}", cred);
        assert!(!printed.contains("sk-ant-secret"));
    }
}
