use serde::{Deserialize, Serialize};
use super::design::Design;

/// Errors at or above this count stop the run from scheduling more nodes.
pub const MAX_ACCUMULATED_ERRORS: usize = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Timeout,
}

impl PipelineStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Timeout)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Success,
    Failed,
}

/// Outcome of one node's whole attempt sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    pub agent_name: String,
    pub role: String,
    pub content: String,
    pub tokens_used: u64,
    pub cost_estimate: f64,
    pub duration_ms: u64,
    pub status: AgentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentResult {
    pub fn is_success(&self) -> bool {
        self.status == AgentStatus::Success
    }

    /// Numeric view of a result attribute. Falls back to a numeric key of the
    /// content when the content is a JSON object.
    pub fn numeric_field(&self, field: &str) -> Option<f64> {
        match field {
            "tokens_used" => Some(self.tokens_used as f64),
            "cost_estimate" => Some(self.cost_estimate),
            "duration_ms" => Some(self.duration_ms as f64),
            "duration" => Some(self.duration_ms as f64 / 1000.0),
            _ => serde_json::from_str::<serde_json::Value>(self.content.trim())
                .ok()
                .and_then(|v| v.get(field).and_then(numeric_value)),
        }
    }
}

fn numeric_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        serde_json::Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// A list that only grows. Merges append; nothing is removed or replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppendOnly<T>(Vec<T>);

impl<T> Default for AppendOnly<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> AppendOnly<T> {
    pub fn push(&mut self, item: T) {
        self.0.push(item);
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = T>) {
        self.0.extend(items);
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&T> {
        self.0.last()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.0
    }
}

/// Shared run state. `agent_results` and `errors` accumulate; every other
/// field is overwritten by the latest update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    pub design: Design,
    pub current_step: u32,
    pub max_steps: u32,
    pub timeout_seconds: u64,
    pub agent_results: AppendOnly<AgentResult>,
    pub errors: AppendOnly<String>,
    pub status: PipelineStatus,
    pub total_cost: f64,
    pub current_agent: Option<String>,
    pub final_output: Option<String>,
}

impl PipelineState {
    pub fn new(design: Design, max_steps: u32, timeout_seconds: u64) -> Self {
        Self {
            design,
            current_step: 0,
            max_steps,
            timeout_seconds,
            agent_results: AppendOnly::default(),
            errors: AppendOnly::default(),
            status: PipelineStatus::Pending,
            total_cost: 0.0,
            current_agent: None,
            final_output: None,
        }
    }

    /// Global stop condition checked by every routing gate.
    pub fn should_stop(&self) -> bool {
        self.errors.len() >= MAX_ACCUMULATED_ERRORS
            || self.current_step >= self.max_steps
            || self.status.is_terminal()
    }

    /// Numeric top-level fields visible to edge conditions.
    pub fn numeric_field(&self, field: &str) -> Option<f64> {
        match field {
            "current_step" => Some(self.current_step as f64),
            "max_steps" => Some(self.max_steps as f64),
            "timeout_seconds" => Some(self.timeout_seconds as f64),
            "total_cost" => Some(self.total_cost),
            _ => None,
        }
    }

    /// Apply one node's update in place.
    pub fn apply(&mut self, update: StateUpdate) {
        self.agent_results.extend(update.agent_results);
        self.errors.extend(update.errors);

        // Counters are last-write, but a stale branch snapshot never moves them back.
        if let Some(step) = update.current_step {
            self.current_step = self.current_step.max(step);
        }
        if let Some(cost) = update.total_cost {
            self.total_cost = self.total_cost.max(cost);
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(agent) = update.current_agent {
            self.current_agent = Some(agent);
        }
        if let Some(output) = update.final_output {
            self.final_output = Some(output);
        }
    }
}

/// Pure merge: the state after `update`.
pub fn merge(mut state: PipelineState, update: StateUpdate) -> PipelineState {
    state.apply(update);
    state
}

/// What a node hands back. List fields are appended, `Some` fields overwrite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub agent_results: Vec<AgentResult>,
    pub errors: Vec<String>,
    pub current_step: Option<u32>,
    pub total_cost: Option<f64>,
    pub status: Option<PipelineStatus>,
    pub current_agent: Option<String>,
    pub final_output: Option<String>,
}

/// Final report of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub design_name: String,
    pub status: PipelineStatus,
    pub agent_results: Vec<AgentResult>,
    pub total_cost: f64,
    pub total_duration_ms: u64,
    pub total_tokens: u64,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::design::AgentSpec;

    fn state() -> PipelineState {
        let design = Design::new("d", "", vec![AgentSpec::new("a", "collector", "m", "")]);
        PipelineState::new(design, 50, 300)
    }

    fn result(name: &str, status: AgentStatus) -> AgentResult {
        AgentResult {
            agent_name: name.to_string(),
            role: "analyzer".to_string(),
            content: "x".to_string(),
            tokens_used: 10,
            cost_estimate: 0.01,
            duration_ms: 5,
            status,
            error: None,
        }
    }

    #[test]
    fn test_new_state_is_zeroed() {
        let s = state();
        assert_eq!(s.current_step, 0);
        assert!(s.agent_results.is_empty());
        assert!(s.errors.is_empty());
        assert_eq!(s.status, PipelineStatus::Pending);
        assert!(!s.should_stop());
    }

    #[test]
    fn test_merge_appends_accumulators() {
        let s = merge(state(), StateUpdate {
            agent_results: vec![result("a", AgentStatus::Success)],
            errors: vec!["e1".into()],
            ..Default::default()
        });
        let s = merge(s, StateUpdate {
            agent_results: vec![result("b", AgentStatus::Failed)],
            errors: vec!["e2".into()],
            ..Default::default()
        });
        assert_eq!(s.agent_results.len(), 2);
        assert_eq!(s.errors.as_slice(), &["e1".to_string(), "e2".to_string()]);
    }

    #[test]
    fn test_merge_overwrites_scalars() {
        let s = merge(state(), StateUpdate {
            current_agent: Some("a".into()),
            final_output: Some("first".into()),
            ..Default::default()
        });
        let s = merge(s, StateUpdate {
            current_agent: Some("b".into()),
            final_output: Some("second".into()),
            ..Default::default()
        });
        assert_eq!(s.current_agent.as_deref(), Some("b"));
        assert_eq!(s.final_output.as_deref(), Some("second"));
    }

    #[test]
    fn test_counters_never_move_back() {
        let s = merge(state(), StateUpdate { current_step: Some(3), total_cost: Some(0.5), ..Default::default() });
        let s = merge(s, StateUpdate { current_step: Some(2), total_cost: Some(0.2), ..Default::default() });
        assert_eq!(s.current_step, 3);
        assert!((s.total_cost - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_should_stop_on_errors() {
        let mut s = state();
        s.errors.extend(vec!["a".to_string(), "b".to_string()]);
        assert!(!s.should_stop());
        s.errors.push("c".to_string());
        assert!(s.should_stop());
    }

    #[test]
    fn test_should_stop_on_steps_and_status() {
        let mut s = state();
        s.current_step = 50;
        assert!(s.should_stop());

        let mut s = state();
        s.status = PipelineStatus::Running;
        assert!(!s.should_stop());
        s.status = PipelineStatus::Timeout;
        assert!(s.should_stop());
    }

    #[test]
    fn test_numeric_fields() {
        let mut s = state();
        s.current_step = 4;
        assert_eq!(s.numeric_field("current_step"), Some(4.0));
        assert_eq!(s.numeric_field("errors"), None);

        let mut r = result("a", AgentStatus::Success);
        r.content = r#"{"score": 0.9, "label": "ok", "count": "3"}"#.to_string();
        assert_eq!(r.numeric_field("tokens_used"), Some(10.0));
        assert_eq!(r.numeric_field("score"), Some(0.9));
        assert_eq!(r.numeric_field("count"), Some(3.0));
        assert_eq!(r.numeric_field("label"), None);
        assert_eq!(r.numeric_field("missing"), None);
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&PipelineStatus::Timeout).unwrap(), "\"timeout\"");
        assert_eq!(serde_json::to_string(&AgentStatus::Success).unwrap(), "\"success\"");
    }
}
