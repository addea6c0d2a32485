use std::sync::Arc;
use std::time::{Duration, Instant};
use futures::stream::{FuturesUnordered, StreamExt};
use crate::agents::node::AgentNode;
use crate::config::types::EngineSettings;
use crate::errors::FlowError;
use crate::llm::router::CompletionRouter;
use super::design::Design;
use super::events::{EventQueue, PipelineEvent, StatusSink};
use super::metrics::assemble_result;
use super::state::{PipelineResult, PipelineState, PipelineStatus, StateUpdate};
use super::topology::{compile, CompiledGraph};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub max_steps: u32,
    pub timeout: Duration,
    /// Unit of the per-node retry backoff
    pub backoff_unit: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_steps: 50,
            timeout: Duration::from_secs(300),
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl From<&EngineSettings> for EngineConfig {
    fn from(settings: &EngineSettings) -> Self {
        Self {
            max_steps: settings.max_steps,
            timeout: settings.timeout(),
            backoff_unit: settings.backoff_unit(),
        }
    }
}

/// Drives compiled designs to completion. Holds no per-run state, so one
/// engine can execute many designs concurrently.
pub struct ExecutionEngine {
    router: Arc<CompletionRouter>,
    config: EngineConfig,
    status_sink: Option<Arc<dyn StatusSink>>,
}

impl ExecutionEngine {
    pub fn new(router: Arc<CompletionRouter>) -> Self {
        Self { router, config: EngineConfig::default(), status_sink: None }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_status_sink(mut self, sink: Arc<dyn StatusSink>) -> Self {
        self.status_sink = Some(sink);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Execute `design`. Every outcome, including compile errors and
    /// timeouts, is reported through the returned [`PipelineResult`].
    pub async fn execute(&self, design: &Design) -> PipelineResult {
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let events = EventQueue::new(self.status_sink.clone());

        let graph = match compile(design) {
            Ok(graph) => graph,
            Err(e) => {
                warn!(run_id = %run_id, design = %design.name, error = %e, "Design failed to compile");
                events.emit(PipelineEvent::Failed { error: e.to_string() });
                events.finish().await;
                return compile_failure(design, &e, elapsed_ms(start));
            }
        };

        let nodes: Vec<Arc<AgentNode>> = graph
            .nodes
            .iter()
            .map(|n| Arc::new(AgentNode::new(n.id.clone(), n.spec.clone(), self.router.clone(), self.config.backoff_unit)))
            .collect();

        let mut state = PipelineState::new(design.clone(), self.config.max_steps, self.config.timeout.as_secs());
        state.status = PipelineStatus::Running;

        info!(
            run_id = %run_id,
            design = %design.name,
            agents = graph.len(),
            explicit_edges = graph.explicit,
            "Pipeline started"
        );
        events.emit(PipelineEvent::Started {
            run_id: run_id.clone(),
            design_name: design.name.clone(),
            agent_count: graph.len(),
        });

        let outcome = tokio::time::timeout(self.config.timeout, drive(&graph, &nodes, &mut state, &events)).await;
        let duration_ms = elapsed_ms(start);
        let mut result = assemble_result(&state, duration_ms);

        match outcome {
            Ok(Ok(())) => {
                info!(
                    run_id = %run_id,
                    status = %result.status,
                    results = result.agent_results.len(),
                    cost_usd = result.total_cost,
                    duration_ms,
                    "Pipeline finished"
                );
                match result.status {
                    PipelineStatus::Failed => events.emit(PipelineEvent::Failed {
                        error: result.error.clone().unwrap_or_else(|| "All agents failed".into()),
                    }),
                    _ => events.emit(PipelineEvent::Completed {
                        total_cost_usd: result.total_cost,
                        total_tokens: result.total_tokens,
                        duration_ms,
                    }),
                }
            }
            Ok(Err(e)) => {
                error!(run_id = %run_id, error = %e, "Pipeline aborted");
                let message = self.router.redact(&e.to_string());
                result.status = PipelineStatus::Failed;
                result.error = Some(message.clone());
                events.emit(PipelineEvent::Failed { error: message });
            }
            Err(_) => {
                let limit = describe_timeout(self.config.timeout);
                warn!(run_id = %run_id, timeout = %limit, results = result.agent_results.len(), "Pipeline timed out");
                result.status = PipelineStatus::Timeout;
                result.error = Some(format!("Pipeline execution timed out after {}", limit));
                events.emit(PipelineEvent::TimedOut { timeout_secs: self.config.timeout.as_secs() });
            }
        }

        events.finish().await;
        result
    }
}

/// Run the graph until nothing is left to schedule. Each node runs at most
/// once; completions merge into `state` in the order they finish.
///
/// A routed node waits until none of its predecessors is running or can
/// still be reached from running or waiting work, so a join sees the output
/// of every branch that feeds it.
async fn drive(
    graph: &CompiledGraph,
    nodes: &[Arc<AgentNode>],
    state: &mut PipelineState,
    events: &EventQueue,
) -> Result<(), FlowError> {
    let mut schedule = Schedule::new(graph.len());
    let mut running = FuturesUnordered::new();

    for &entry in &graph.entries {
        schedule.launch(entry);
        running.push(run_node(entry, nodes[entry].clone(), state.clone()));
    }

    while let Some((index, outcome)) = running.next().await {
        schedule.finish(index);
        let update = outcome?;
        if let Some(result) = update.agent_results.first() {
            events.emit(PipelineEvent::AgentCompleted {
                agent_name: result.agent_name.clone(),
                status: result.status,
                duration_ms: result.duration_ms,
                cost_usd: result.cost_estimate,
            });
        }
        state.apply(update);

        for next in graph.successors(index, state) {
            if !schedule.route(next) {
                debug!(node = %graph.nodes[next].id, "Already scheduled or waiting, skipping");
            }
        }

        for next in schedule.ready(graph) {
            debug!(node = %graph.nodes[next].id, "Predecessors settled, launching");
            schedule.launch(next);
            running.push(run_node(next, nodes[next].clone(), state.clone()));
        }
    }
    Ok(())
}

/// Launch bookkeeping for one run.
struct Schedule {
    launched: Vec<bool>,
    running: Vec<bool>,
    waiting: Vec<usize>,
}

impl Schedule {
    fn new(count: usize) -> Self {
        Self {
            launched: vec![false; count],
            running: vec![false; count],
            waiting: Vec::new(),
        }
    }

    fn launch(&mut self, index: usize) {
        self.waiting.retain(|w| *w != index);
        self.launched[index] = true;
        self.running[index] = true;
    }

    fn finish(&mut self, index: usize) {
        self.running[index] = false;
    }

    /// Queue a routed node. False when it already ran or is queued.
    fn route(&mut self, index: usize) -> bool {
        if self.launched[index] || self.waiting.contains(&index) {
            return false;
        }
        self.waiting.push(index);
        true
    }

    /// Waiting nodes none of whose predecessors can still produce output.
    fn ready(&self, graph: &CompiledGraph) -> Vec<usize> {
        self.waiting
            .iter()
            .copied()
            .filter(|&node| graph.predecessors[node].iter().all(|&p| !self.blocks(graph, p, node)))
            .collect()
    }

    fn blocks(&self, graph: &CompiledGraph, predecessor: usize, node: usize) -> bool {
        if self.running[predecessor] {
            return true;
        }
        if self.launched[predecessor] {
            return false;
        }
        let from_running = (0..self.running.len()).any(|r| self.running[r] && graph.reaches(r, predecessor));
        let from_waiting = self
            .waiting
            .iter()
            .any(|&w| w != node && (w == predecessor || graph.reaches(w, predecessor)));
        from_running || from_waiting
    }
}

async fn run_node(index: usize, node: Arc<AgentNode>, snapshot: PipelineState) -> (usize, Result<StateUpdate, FlowError>) {
    (index, node.execute(&snapshot).await)
}

fn compile_failure(design: &Design, error: &FlowError, duration_ms: u64) -> PipelineResult {
    PipelineResult {
        design_name: design.name.clone(),
        status: PipelineStatus::Failed,
        agent_results: Vec::new(),
        total_cost: 0.0,
        total_duration_ms: duration_ms,
        total_tokens: 0,
        output: String::new(),
        error: Some(error.to_string()),
    }
}

fn describe_timeout(timeout: Duration) -> String {
    if timeout.subsec_millis() == 0 {
        format!("{}s", timeout.as_secs())
    } else {
        format!("{}ms", timeout.as_millis())
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
