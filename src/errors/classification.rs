use super::types::FlowError;

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    pub retryable: bool,
}

impl FlowError {
    /// Name the error for logs and decide whether a node may try again.
    ///
    /// Provider-side and transport failures are transient. Anything the caller
    /// has to fix (keys, config, the design itself) is not.
    pub fn classify(&self) -> ErrorClassification {
        let (error_type, retryable) = match self {
            FlowError::RateLimit(_) => ("RateLimitError", true),
            FlowError::Billing(_) => ("BillingError", true),
            FlowError::Network(_) => ("NetworkError", true),
            FlowError::Timeout(_) => ("TimeoutError", true),
            FlowError::LLMApi(_) => ("LLMApiError", true),
            FlowError::Io(_) => ("IoError", true),
            FlowError::Json(_) => ("JsonError", true),
            FlowError::Internal(_) => ("InternalError", true),

            FlowError::Authentication(_) => ("AuthenticationError", false),
            FlowError::Config(_) => ("ConfigError", false),
            FlowError::NoProvider(_) => ("NoProviderError", false),
            FlowError::Compile(_) => ("CompileError", false),
            FlowError::Security(_) => ("SecurityError", false),
            FlowError::Yaml(_) => ("YamlError", false),
        };
        ErrorClassification { error_type, retryable }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_is_retryable() {
        let err = FlowError::RateLimit("too many requests".into());
        let class = err.classify();
        assert!(class.retryable);
        assert_eq!(class.error_type, "RateLimitError");
    }

    #[test]
    fn test_auth_error_not_retryable() {
        let err = FlowError::Authentication("bad key".into());
        let class = err.classify();
        assert!(!class.retryable);
        assert_eq!(class.error_type, "AuthenticationError");
    }

    #[test]
    fn test_no_provider_not_retryable_and_global() {
        let err = FlowError::NoProvider("none".into());
        assert!(!err.classify().retryable);
        assert!(err.is_global());
    }

    #[test]
    fn test_compile_error_not_retryable() {
        let err = FlowError::Compile("cycle".into());
        assert!(!err.classify().retryable);
        assert!(!err.is_global());
    }

    #[test]
    fn test_security_not_retryable() {
        let err = FlowError::Security("injection".into());
        assert!(!err.classify().retryable);
    }

    #[test]
    fn test_network_error_retryable() {
        let err = FlowError::Network("connection refused".into());
        assert!(err.classify().retryable);
    }

    #[test]
    fn test_llm_api_retryable() {
        let err = FlowError::LLMApi("overloaded".into());
        assert!(err.classify().retryable);
    }
}
