use serde_json::{json, Value};
use std::sync::LazyLock;

/// Shape of a design document. Numeric bounds and topology are checked later,
/// when the design is compiled.
pub static DESIGN_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "required": ["name", "agents"],
        "properties": {
            "name": { "type": "string" },
            "description": { "type": "string" },
            "agents": {
                "type": "array",
                "items": { "$ref": "#/definitions/agent" }
            },
            "edges": {
                "type": ["array", "null"],
                "items": { "$ref": "#/definitions/edge" }
            }
        },
        "definitions": {
            "agent": {
                "type": "object",
                "required": ["name", "role"],
                "properties": {
                    "name": { "type": "string" },
                    "role": { "type": "string" },
                    "model": { "type": "string" },
                    "description": { "type": "string" },
                    "temperature": { "type": "number" },
                    "max_output_tokens": { "type": "integer" },
                    "retry_count": { "type": "integer" },
                    "custom_prompt": { "type": ["string", "null"] },
                    "is_custom_role": { "type": "boolean" }
                }
            },
            "edge": {
                "type": "object",
                "required": ["source", "target"],
                "properties": {
                    "source": { "type": "string" },
                    "target": { "type": "string" },
                    "condition": { "type": ["string", "null"] }
                }
            }
        }
    })
});

/// Shape of the engine configuration file. Checked before deserialization;
/// violations are reported as warnings.
pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "properties": {
            "providers": {
                "type": "object",
                "properties": {
                    "anthropic": { "$ref": "#/definitions/provider" },
                    "openai": { "$ref": "#/definitions/provider" },
                    "google": { "$ref": "#/definitions/provider" }
                },
                "additionalProperties": false
            },
            "engine": {
                "type": "object",
                "properties": {
                    "max_steps": { "type": "integer", "minimum": 1 },
                    "timeout_secs": { "type": "integer", "minimum": 1 },
                    "backoff_base_ms": { "type": "integer", "minimum": 0 }
                }
            }
        },
        "definitions": {
            "provider": {
                "type": ["object", "null"],
                "properties": {
                    "api_key": { "type": "string" },
                    "base_url": { "type": "string" }
                }
            }
        }
    })
});

#[cfg(test)]
mod tests {
    use super::*;

    fn is_valid(instance: &Value) -> bool {
        let compiled = jsonschema::JSONSchema::compile(&DESIGN_SCHEMA).unwrap();
        compiled.is_valid(instance)
    }

    #[test]
    fn test_minimal_design_valid() {
        let design = json!({
            "name": "d",
            "agents": [{ "name": "a", "role": "collector" }]
        });
        assert!(is_valid(&design));
    }

    #[test]
    fn test_missing_agents_invalid() {
        assert!(!is_valid(&json!({ "name": "d" })));
    }

    #[test]
    fn test_edge_requires_target() {
        let design = json!({
            "name": "d",
            "agents": [{ "name": "a", "role": "collector" }],
            "edges": [{ "source": "a" }]
        });
        assert!(!is_valid(&design));
    }

    #[test]
    fn test_config_schema_flags_unknown_provider() {
        let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA).unwrap();
        assert!(compiled.is_valid(&json!({ "providers": { "openai": { "api_key": "$OPENAI_API_KEY" } } })));
        assert!(!compiled.is_valid(&json!({ "providers": { "mistral": {} } })));
        assert!(!compiled.is_valid(&json!({ "engine": { "max_steps": 0 } })));
    }

    #[test]
    fn test_wrong_type_invalid() {
        let design = json!({
            "name": "d",
            "agents": [{ "name": "a", "role": "collector", "temperature": "hot" }]
        });
        assert!(!is_valid(&design));
    }
}
