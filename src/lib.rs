//! Compile declarative multi-agent designs into executable graphs and run
//! them against routed LLM providers with bounded retries, timeouts and cost
//! accounting.

pub mod agents;
pub mod config;
pub mod errors;
pub mod llm;
pub mod pipeline;
pub mod utils;
