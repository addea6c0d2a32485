use std::sync::Arc;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::errors::FlowError;
use super::catalog::{ComplexityTier, ProviderKind};
use tracing::{info, warn};

/// One routing decision, reported after every successful completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub provider: ProviderKind,
    pub model: String,
    pub tier: ComplexityTier,
    pub latency_ms: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub cost_usd: f64,
}

#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn record(&self, decision: RoutingDecision) -> Result<(), FlowError>;
}

/// Default sink: structured log line per decision.
pub struct TracingTelemetry;

#[async_trait]
impl TelemetrySink for TracingTelemetry {
    async fn record(&self, decision: RoutingDecision) -> Result<(), FlowError> {
        info!(
            target: "agentflow::telemetry",
            provider = %decision.provider,
            model = %decision.model,
            tier = %decision.tier,
            latency_ms = decision.latency_ms,
            prompt_tokens = decision.prompt_tokens,
            completion_tokens = decision.completion_tokens,
            cost_usd = decision.cost_usd,
            "Routing decision"
        );
        Ok(())
    }
}

/// Hand a decision to the sink without waiting on it. Sink failures are logged.
pub fn report(sink: &Arc<dyn TelemetrySink>, decision: RoutingDecision) {
    let sink = sink.clone();
    tokio::spawn(async move {
        if let Err(e) = sink.record(decision).await {
            warn!(error = %e, "Telemetry sink rejected routing decision");
        }
    });
}
