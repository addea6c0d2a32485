use async_trait::async_trait;
use crate::errors::FlowError;
use super::catalog::ProviderKind;
use super::types::{CompletionRequest, LLMResponse};

#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Chat completion against the model named in the request
    async fn complete(&self, request: &CompletionRequest) -> Result<LLMResponse, FlowError>;

    /// Backend this client talks to
    fn provider_kind(&self) -> ProviderKind;
}
