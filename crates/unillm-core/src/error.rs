//! Error taxonomy shared by every provider and the tool executor

use thiserror::Error;

/// Boxed error returned by tool bodies
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Closed set of error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Authentication,
    RateLimit,
    Timeout,
    Api,
    Embeddings,
    StructuredData,
    ToolExecution,
    ToolValidation,
    ToolTimeout,
    UnsupportedFeature,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "ConfigurationError",
            ErrorKind::Authentication => "AuthenticationError",
            ErrorKind::RateLimit => "RateLimitError",
            ErrorKind::Timeout => "TimeoutError",
            ErrorKind::Api => "APIError",
            ErrorKind::Embeddings => "EmbeddingsError",
            ErrorKind::StructuredData => "StructuredDataError",
            ErrorKind::ToolExecution => "ToolExecutionError",
            ErrorKind::ToolValidation => "ToolValidationError",
            ErrorKind::ToolTimeout => "ToolTimeoutError",
            ErrorKind::UnsupportedFeature => "UnsupportedFeatureError",
        };
        f.write_str(name)
    }
}

/// Errors that can occur in any unillm operation
#[derive(Error, Debug)]
pub enum LlmError {
    /// Invalid or incomplete provider configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Vendor rejected the credential (HTTP 401)
    #[error("{provider} authentication failed: {message}")]
    Authentication { provider: String, message: String },

    /// Vendor rate limit hit (HTTP 429)
    #[error("{provider} rate limited: {message}")]
    RateLimit { provider: String, message: String },

    /// Vendor request did not complete in time
    #[error("{provider} request timed out: {message}")]
    Timeout { provider: String, message: String },

    /// Any other vendor failure
    #[error("{provider} API error{}: {message}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    Api {
        provider: String,
        status: Option<u16>,
        message: String,
    },

    /// Embedding request or response could not be used
    #[error("Embeddings error: {0}")]
    Embeddings(String),

    /// Model output did not parse or did not match the schema
    #[error("Structured data error: {message}")]
    StructuredData {
        message: String,
        /// Raw arguments returned by the model, when there were any
        raw: Option<String>,
    },

    /// Tool body failed, or the call could not be dispatched
    #[error("Tool '{tool}' failed: {message}")]
    ToolExecution {
        tool: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Tool input did not match the tool's parameter schema
    #[error("Invalid input for tool '{tool}': {message}")]
    ToolValidation { tool: String, message: String },

    /// Tool did not finish within its timeout
    #[error("Tool '{tool}' timed out after {timeout_ms}ms")]
    ToolTimeout { tool: String, timeout_ms: u64 },

    /// The vendor does not offer this operation
    #[error("{provider} does not support {feature}")]
    UnsupportedFeature { provider: String, feature: String },
}

impl LlmError {
    /// The kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LlmError::Configuration(_) => ErrorKind::Configuration,
            LlmError::Authentication { .. } => ErrorKind::Authentication,
            LlmError::RateLimit { .. } => ErrorKind::RateLimit,
            LlmError::Timeout { .. } => ErrorKind::Timeout,
            LlmError::Api { .. } => ErrorKind::Api,
            LlmError::Embeddings(_) => ErrorKind::Embeddings,
            LlmError::StructuredData { .. } => ErrorKind::StructuredData,
            LlmError::ToolExecution { .. } => ErrorKind::ToolExecution,
            LlmError::ToolValidation { .. } => ErrorKind::ToolValidation,
            LlmError::ToolTimeout { .. } => ErrorKind::ToolTimeout,
            LlmError::UnsupportedFeature { .. } => ErrorKind::UnsupportedFeature,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create an API error
    pub fn api(provider: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Api {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a structured data error
    pub fn structured(message: impl Into<String>, raw: Option<String>) -> Self {
        Self::StructuredData {
            message: message.into(),
            raw,
        }
    }

    /// Create a tool execution error without an underlying cause
    pub fn tool_execution(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool: tool.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a tool validation error
    pub fn tool_validation(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolValidation {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported feature error
    pub fn unsupported(provider: impl Into<String>, feature: impl Into<String>) -> Self {
        Self::UnsupportedFeature {
            provider: provider.into(),
            feature: feature.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(LlmError::configuration("x").kind(), ErrorKind::Configuration);
        assert_eq!(LlmError::api("openai", Some(500), "boom").kind(), ErrorKind::Api);
        assert_eq!(
            LlmError::ToolTimeout { tool: "t".into(), timeout_ms: 5 }.kind(),
            ErrorKind::ToolTimeout
        );
        assert_eq!(
            LlmError::unsupported("anthropic", "embeddings").kind(),
            ErrorKind::UnsupportedFeature
        );
    }

    #[test]
    fn test_api_error_display() {
        let with_status = LlmError::api("openai", Some(500), "server exploded");
        assert_eq!(with_status.to_string(), "openai API error (500): server exploded");

        let without_status = LlmError::api("openai", None, "connection reset");
        assert_eq!(without_status.to_string(), "openai API error: connection reset");
    }

    #[test]
    fn test_tool_execution_keeps_source() {
        use std::error::Error;

        let cause: BoxError = "disk full".into();
        let err = LlmError::ToolExecution {
            tool: "write_file".into(),
            message: cause.to_string(),
            source: Some(cause),
        };
        assert_eq!(err.source().map(|s| s.to_string()), Some("disk full".to_string()));
        assert_eq!(ErrorKind::ToolExecution.to_string(), "ToolExecutionError");
    }
}
