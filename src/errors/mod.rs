pub mod types;
pub mod classification;
pub mod retry;

pub use types::FlowError;
pub use classification::ErrorClassification;
pub use retry::RetryPolicy;
