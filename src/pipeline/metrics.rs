use crate::agents::role::AgentRole;
use super::state::{AgentResult, PipelineResult, PipelineState, PipelineStatus};

/// Build the final report from a terminal state.
///
/// Totals are sums over the results. The run counts as failed only when no
/// result succeeded.
pub fn assemble_result(state: &PipelineState, total_duration_ms: u64) -> PipelineResult {
    let results: Vec<AgentResult> = state.agent_results.iter().cloned().collect();

    let total_cost: f64 = results.iter().map(|r| r.cost_estimate).sum();
    let total_tokens: u64 = results.iter().map(|r| r.tokens_used).sum();

    let status = if results.iter().any(AgentResult::is_success) {
        PipelineStatus::Completed
    } else {
        PipelineStatus::Failed
    };

    PipelineResult {
        design_name: state.design.name.clone(),
        status,
        output: final_output(&results),
        agent_results: results,
        total_cost,
        total_duration_ms,
        total_tokens,
        error: joined_errors(state),
    }
}

/// Last successful reporter or synthesizer, else the last success of any role.
pub fn final_output(results: &[AgentResult]) -> String {
    let successes = || results.iter().rev().filter(|r| r.is_success());
    successes()
        .find(|r| AgentRole::produces_output(&r.role))
        .or_else(|| successes().next())
        .map(|r| r.content.clone())
        .unwrap_or_default()
}

pub fn joined_errors(state: &PipelineState) -> Option<String> {
    if state.errors.is_empty() {
        None
    } else {
        Some(state.errors.as_slice().join("; "))
    }
}
