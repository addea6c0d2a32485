use std::sync::Arc;
use std::time::{Duration, Instant};
use crate::errors::{FlowError, RetryPolicy};
use crate::llm::catalog::ProviderKind;
use crate::llm::router::{CompletionRouter, RouteRequest};
use crate::llm::tier::tier_for_model_name;
use crate::pipeline::design::AgentSpec;
use crate::pipeline::state::{AgentResult, AgentStatus, PipelineState, StateUpdate};
use crate::utils::truncation::truncate_error;
use super::guard;
use super::role::AgentRole;
use tracing::{info, warn};

/// One executable step of a compiled pipeline.
pub struct AgentNode {
    /// Unique within the graph; equals the declared name unless it was a duplicate.
    pub id: String,
    pub spec: AgentSpec,
    pub role: AgentRole,
    router: Arc<CompletionRouter>,
    policy: RetryPolicy,
}

impl AgentNode {
    pub fn new(id: String, spec: AgentSpec, router: Arc<CompletionRouter>, backoff_unit: Duration) -> Self {
        let role = AgentRole::resolve(&spec);
        let policy = RetryPolicy::new(spec.retry_count, backoff_unit);
        Self { id, spec, role, router, policy }
    }

    /// Run this node against a snapshot of the state.
    ///
    /// Node-local failures come back as a failed [`AgentResult`] inside the
    /// update. `Err` is reserved for failures that end the whole run.
    pub async fn execute(&self, state: &PipelineState) -> Result<StateUpdate, FlowError> {
        let start = Instant::now();

        if let Some(pattern) = guard::scan_design(&state.design) {
            let rejection = guard::rejection();
            warn!(agent = %self.id, pattern, error = %rejection, "Design rejected by injection screening");
            return Ok(self.failure(state, &rejection.to_string(), start));
        }

        let tier = tier_for_model_name(&self.spec.model);
        let preferred = ProviderKind::from_model_name(&self.spec.model);
        let mut attempt = 0u32;

        loop {
            info!(agent = %self.id, role = %self.role, attempt = attempt + 1, "Starting agent execution");

            let request = RouteRequest {
                messages: self.role.build_messages(&self.spec, state),
                tier: Some(tier),
                preferred_provider: preferred,
                max_tokens: self.spec.max_output_tokens,
                temperature: self.spec.temperature,
            };

            match self.router.complete(request).await {
                Ok(completion) => {
                    let duration_ms = start.elapsed().as_millis() as u64;
                    info!(
                        agent = %self.id,
                        duration_ms,
                        tokens = completion.total_tokens(),
                        cost_usd = completion.cost_usd,
                        "Agent completed successfully"
                    );
                    let result = AgentResult {
                        agent_name: self.id.clone(),
                        role: self.spec.role.clone(),
                        content: completion.content.clone(),
                        tokens_used: completion.total_tokens(),
                        cost_estimate: completion.cost_usd,
                        duration_ms,
                        status: AgentStatus::Success,
                        error: None,
                    };
                    return Ok(StateUpdate {
                        agent_results: vec![result],
                        current_step: Some(state.current_step + 1),
                        total_cost: Some(state.total_cost + completion.cost_usd),
                        current_agent: Some(self.id.clone()),
                        final_output: Some(completion.content),
                        ..Default::default()
                    });
                }
                Err(e) if e.is_global() => return Err(e),
                Err(e) => {
                    let classification = e.classify();
                    if !classification.retryable || !self.policy.has_next(attempt) {
                        warn!(
                            agent = %self.id,
                            attempts = attempt + 1,
                            error_type = classification.error_type,
                            error = %e,
                            "Agent failed"
                        );
                        let message = self.router.redact(&format!("Agent '{}' failed: {}", self.id, e));
                        return Ok(self.failure(state, &message, start));
                    }

                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        agent = %self.id,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying after transient error"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    fn failure(&self, state: &PipelineState, error: &str, start: Instant) -> StateUpdate {
        let error = truncate_error(error);
        let result = AgentResult {
            agent_name: self.id.clone(),
            role: self.spec.role.clone(),
            content: String::new(),
            tokens_used: 0,
            cost_estimate: 0.0,
            duration_ms: start.elapsed().as_millis() as u64,
            status: AgentStatus::Failed,
            error: Some(error.clone()),
        };
        StateUpdate {
            agent_results: vec![result],
            errors: vec![error],
            current_step: Some(state.current_step + 1),
            current_agent: Some(self.id.clone()),
            ..Default::default()
        }
    }
}
