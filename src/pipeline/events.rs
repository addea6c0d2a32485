use std::sync::Arc;
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use crate::errors::FlowError;
use super::state::AgentStatus;
use tracing::warn;

/// Progress notifications for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    Started {
        run_id: String,
        design_name: String,
        agent_count: usize,
    },
    AgentCompleted {
        agent_name: String,
        status: AgentStatus,
        duration_ms: u64,
        cost_usd: f64,
    },
    Completed {
        total_cost_usd: f64,
        total_tokens: u64,
        duration_ms: u64,
    },
    Failed {
        error: String,
    },
    TimedOut {
        timeout_secs: u64,
    },
}

/// Receiver of run progress. Failures are logged by the engine and never
/// affect the run.
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn notify(&self, event: PipelineEvent) -> Result<(), FlowError>;
}

#[async_trait]
impl StatusSink for mpsc::UnboundedSender<PipelineEvent> {
    async fn notify(&self, event: PipelineEvent) -> Result<(), FlowError> {
        self.send(event)
            .map_err(|_| FlowError::Internal("status receiver dropped".into()))
    }
}

/// The engine's side of the status channel. Events are queued without
/// waiting and forwarded to the sink in order by a separate task.
pub struct EventQueue {
    tx: Option<mpsc::UnboundedSender<PipelineEvent>>,
    forwarder: Option<JoinHandle<()>>,
}

impl EventQueue {
    pub fn new(sink: Option<Arc<dyn StatusSink>>) -> Self {
        let Some(sink) = sink else {
            return Self { tx: None, forwarder: None };
        };
        let (tx, mut rx) = mpsc::unbounded_channel::<PipelineEvent>();
        let forwarder = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(e) = sink.notify(event).await {
                    warn!(error = %e, "Status sink rejected event");
                }
            }
        });
        Self { tx: Some(tx), forwarder: Some(forwarder) }
    }

    pub fn emit(&self, event: PipelineEvent) {
        if let Some(ref tx) = self.tx {
            let _ = tx.send(event);
        }
    }

    /// Close the queue and wait until every queued event reached the sink.
    pub async fn finish(mut self) {
        self.tx.take();
        if let Some(handle) = self.forwarder.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "Status forwarder ended abnormally");
            }
        }
    }
}
