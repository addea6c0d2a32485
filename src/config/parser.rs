use std::path::Path;
use crate::errors::FlowError;
use super::schema::CONFIG_SCHEMA;
use super::types::FlowConfig;
use tracing::warn;

const MAX_CONFIG_BYTES: u64 = 1_048_576;

pub async fn parse_config(path: &Path) -> Result<FlowConfig, FlowError> {
    if !path.exists() {
        return Err(FlowError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > MAX_CONFIG_BYTES {
        return Err(FlowError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    parse_config_str(&content)
}

pub fn parse_config_str(content: &str) -> Result<FlowConfig, FlowError> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;

    // An empty file is an empty mapping
    if yaml.is_null() {
        return Ok(FlowConfig::default());
    }

    validate_schema(&yaml)?;

    let config: FlowConfig = serde_yaml::from_value(yaml)?;
    validate_semantics(&config)?;
    Ok(config)
}

/// Schema violations are logged, not fatal. Semantic checks decide.
fn validate_schema(yaml: &serde_yaml::Value) -> Result<(), FlowError> {
    let json_value = serde_json::to_value(yaml)
        .map_err(|e| FlowError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| FlowError::Config(format!("Schema compilation error: {}", e)))?;

    if let Err(errors) = compiled.validate(&json_value) {
        for e in errors {
            warn!(validation_error = %format!("{} at {}", e, e.instance_path), "Config schema warning");
        }
    }
    Ok(())
}

fn validate_semantics(config: &FlowConfig) -> Result<(), FlowError> {
    if config.engine.max_steps < 1 {
        return Err(FlowError::Config("engine.max_steps must be at least 1".into()));
    }
    if config.engine.timeout_secs < 1 {
        return Err(FlowError::Config("engine.timeout_secs must be at least 1".into()));
    }

    for kind in crate::llm::ProviderKind::ALL {
        let Some(settings) = config.providers.get(kind) else { continue };
        if let Some(url) = &settings.base_url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(FlowError::Config(format!(
                    "providers.{}.base_url must be an http(s) URL, got '{}'",
                    kind, url
                )));
            }
        }
        if settings.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            warn!(provider = %kind, "Provider configured with an empty api_key");
        }
    }
    Ok(())
}
