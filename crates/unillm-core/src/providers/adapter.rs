//! Per-vendor wire translation

use serde_json::Value;

use super::client::VendorRequest;
use crate::config::NormalizedConfig;
use crate::error::{LlmError, Result};
use crate::types::{ChatMessage, FunctionDefinition, ProviderMetadata, TokenUsage, ToolCall, ToolChoice};

/// A chat call in vendor-neutral form
///
/// System messages are already hoisted to the front of `messages`.
#[derive(Debug, Clone)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub temperature: f32,
    pub max_tokens: u32,
    pub tools: &'a [FunctionDefinition],
    /// Only sent when `tools` is non-empty
    pub tool_choice: Option<&'a ToolChoice>,
}

/// A parsed chat response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOutput {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub usage: TokenUsage,
    /// Model reported by the vendor, if any
    pub model: Option<String>,
}

/// Parsed embeddings response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingsOutput {
    pub embeddings: Vec<Vec<f32>>,
    pub usage: TokenUsage,
}

/// Translation between the uniform contract and one vendor's HTTP API
///
/// Adapters never perform I/O; [`VendorProvider`](super::VendorProvider)
/// sends what they build and hands back what the vendor returned.
pub trait VendorAdapter: Send + Sync + Sized {
    /// Build from a validated config
    fn from_config(config: &NormalizedConfig) -> Result<Self>;

    fn metadata(&self) -> ProviderMetadata;

    fn chat_request(&self, request: &ChatRequest<'_>) -> Result<VendorRequest>;

    fn parse_chat(&self, body: &Value) -> Result<ChatOutput>;

    fn embeddings_request(&self, inputs: &[String], model: &str) -> Result<VendorRequest> {
        let _ = (inputs, model);
        Err(LlmError::unsupported(self.metadata().id, "embeddings"))
    }

    fn parse_embeddings(&self, body: &Value) -> Result<EmbeddingsOutput> {
        let _ = body;
        Err(LlmError::unsupported(self.metadata().id, "embeddings"))
    }
}

/// Strip a trailing slash from a configured base URL
pub(crate) fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Convert a JSON number array into an embedding vector
pub(crate) fn to_vector(provider: &str, value: Option<&Value>) -> Result<Vec<f32>> {
    value
        .and_then(Value::as_array)
        .and_then(|values| {
            values
                .iter()
                .map(|v| v.as_f64().map(|f| f as f32))
                .collect::<Option<Vec<f32>>>()
        })
        .ok_or_else(|| LlmError::Embeddings(format!("{} returned a malformed embedding", provider)))
}

/// Read a token counter, defaulting to zero and saturating at `u32::MAX`
pub(crate) fn count(value: &Value, pointer: &str) -> u32 {
    value
        .pointer(pointer)
        .and_then(Value::as_u64)
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        .unwrap_or_default()
}

/// Tool arguments as the model sent them
///
/// Vendors that send a JSON string get it parsed; unparseable strings are
/// kept as-is so schema validation can report them.
pub(crate) fn parse_arguments(raw: &Value) -> Value {
    match raw {
        Value::String(s) if s.trim().is_empty() => Value::Object(Default::default()),
        Value::String(s) => serde_json::from_str(s).unwrap_or_else(|_| raw.clone()),
        Value::Null => Value::Object(Default::default()),
        other => other.clone(),
    }
}
