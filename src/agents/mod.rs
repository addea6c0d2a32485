pub mod guard;
pub mod node;
pub mod role;

pub use node::AgentNode;
pub use role::AgentRole;
