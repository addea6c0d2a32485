pub mod provider;
pub mod anthropic;
pub mod openai;
pub mod gemini;
pub mod mock;
pub mod router;
pub mod types;
pub mod catalog;
pub mod tier;
pub mod telemetry;

pub use catalog::{ComplexityTier, ModelConfig, ProviderKind};
pub use provider::LLMProvider;
pub use router::{CompletionRouter, RouteRequest};
pub use telemetry::{RoutingDecision, TelemetrySink, TracingTelemetry};
pub use types::{CompletionResult, LLMResponse, Message};
