use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::config::schema::DESIGN_SCHEMA;
use crate::errors::FlowError;

pub const MAX_TEMPERATURE: f32 = 2.0;
pub const MAX_OUTPUT_TOKENS: u32 = 16_384;
pub const MAX_RETRY_COUNT: u32 = 10;

/// One agent of a design. `role` is an open tag; unknown tags fall back to
/// the analyzer behaviour when the design is compiled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    pub role: String,
    #[serde(default = "default_model", alias = "model_identifier")]
    pub model: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
    #[serde(default)]
    pub is_custom_role: bool,
}

fn default_model() -> String { "claude-sonnet-4-5-20250929".to_string() }
fn default_temperature() -> f32 { 0.7 }
fn default_max_output_tokens() -> u32 { 4096 }
fn default_retry_count() -> u32 { 3 }

impl AgentSpec {
    pub fn new(name: &str, role: &str, model: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            role: role.to_string(),
            model: model.to_string(),
            description: description.to_string(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            retry_count: default_retry_count(),
            custom_prompt: None,
            is_custom_role: false,
        }
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn with_custom_prompt(mut self, prompt: &str) -> Self {
        self.custom_prompt = Some(prompt.to_string());
        self.is_custom_role = true;
        self
    }

    pub fn validate(&self) -> Result<(), FlowError> {
        if self.name.trim().is_empty() {
            return Err(FlowError::Compile("Agent name must not be empty".into()));
        }
        if !(0.0..=MAX_TEMPERATURE).contains(&self.temperature) {
            return Err(FlowError::Compile(format!(
                "Agent '{}': temperature {} outside [0, {}]",
                self.name, self.temperature, MAX_TEMPERATURE
            )));
        }
        if !(1..=MAX_OUTPUT_TOKENS).contains(&self.max_output_tokens) {
            return Err(FlowError::Compile(format!(
                "Agent '{}': max_output_tokens {} outside [1, {}]",
                self.name, self.max_output_tokens, MAX_OUTPUT_TOKENS
            )));
        }
        if self.retry_count > MAX_RETRY_COUNT {
            return Err(FlowError::Compile(format!(
                "Agent '{}': retry_count {} exceeds {}",
                self.name, self.retry_count, MAX_RETRY_COUNT
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub source: String,
    pub target: String,
    /// `field op number`, e.g. `score > 0.8`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl EdgeSpec {
    pub fn new(source: &str, target: &str) -> Self {
        Self { source: source.to_string(), target: target.to_string(), condition: None }
    }

    pub fn conditional(source: &str, target: &str, condition: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            condition: Some(condition.to_string()),
        }
    }
}

/// A pipeline as produced by the discussion front-end. Without edges the
/// agents run in declaration order; with edges, the edges alone decide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Design {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub agents: Vec<AgentSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edges: Option<Vec<EdgeSpec>>,
}

impl Design {
    pub fn new(name: &str, description: &str, agents: Vec<AgentSpec>) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            agents,
            edges: None,
        }
    }

    pub fn with_edges(mut self, edges: Vec<EdgeSpec>) -> Self {
        self.edges = Some(edges);
        self
    }

    /// Edges to honour. An empty list counts as no edges.
    pub fn explicit_edges(&self) -> Option<&[EdgeSpec]> {
        self.edges.as_deref().filter(|e| !e.is_empty())
    }

    /// Every free-text field a user could have written.
    pub fn text_fragments(&self) -> Vec<&str> {
        let mut out = vec![self.name.as_str(), self.description.as_str()];
        for agent in &self.agents {
            out.push(&agent.name);
            out.push(&agent.role);
            out.push(&agent.description);
            if let Some(prompt) = &agent.custom_prompt {
                out.push(prompt);
            }
        }
        out
    }
}

/// Load a design from a `.json`, `.yaml` or `.yml` file and check it against
/// the design schema.
pub async fn load_design(path: &Path) -> Result<Design, FlowError> {
    if !path.exists() {
        return Err(FlowError::Config(format!("Design file not found: {}", path.display())));
    }
    let content = tokio::fs::read_to_string(path).await?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    parse_design(&content, is_yaml)
}

pub fn parse_design(content: &str, is_yaml: bool) -> Result<Design, FlowError> {
    let json_value: serde_json::Value = if is_yaml {
        let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;
        serde_json::to_value(yaml)?
    } else {
        serde_json::from_str(content)?
    };

    validate_schema(&json_value)?;

    Ok(serde_json::from_value(json_value)?)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), FlowError> {
    let compiled = jsonschema::JSONSchema::compile(&DESIGN_SCHEMA)
        .map_err(|e| FlowError::Config(format!("Schema compilation error: {}", e)))?;

    let result = compiled.validate(json_value);
    if let Err(errors) = result {
        let messages: Vec<String> = errors
            .map(|e| format!("{} at {}", e, e.instance_path))
            .collect();
        if !messages.is_empty() {
            return Err(FlowError::Config(format!("Invalid design: {}", messages.join("; "))));
        }
    }
    Ok(())
}
