pub mod condition;
pub mod design;
pub mod engine;
pub mod events;
pub mod metrics;
pub mod state;
pub mod topology;

pub use design::{AgentSpec, Design, EdgeSpec};
pub use engine::{EngineConfig, ExecutionEngine};
pub use events::{PipelineEvent, StatusSink};
pub use state::{AgentResult, AgentStatus, PipelineResult, PipelineState, PipelineStatus};
pub use topology::{compile, CompiledGraph};
