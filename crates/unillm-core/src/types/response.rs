//! Uniform response records

use serde::{Deserialize, Serialize};

use crate::tools::ToolResult;

/// Token usage reported by the vendor
///
/// Zero-filled when the vendor does not report usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Create usage; total is the sum of both sides
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Add another round-trip's usage to this one
    pub fn accumulate(&mut self, other: TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// Result of a text generation
#[derive(Debug)]
pub struct TextGenerationResponse {
    /// Final text content
    pub content: String,
    /// Model that produced the content
    pub model: String,
    /// Usage summed over the initial request and any follow-up
    pub usage: TokenUsage,
    /// Tools executed on the model's behalf, in request order
    pub tool_results: Vec<ToolResult>,
}

/// Result of a structured generation
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredDataResponse<T> {
    /// Schema-validated value
    pub data: T,
    /// Model that produced the value
    pub model: String,
    pub usage: TokenUsage,
}

impl<T> StructuredDataResponse<T> {
    /// Convert the payload, keeping model and usage
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StructuredDataResponse<U> {
        StructuredDataResponse {
            data: f(self.data),
            model: self.model,
            usage: self.usage,
        }
    }
}

/// Result of an embeddings request
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingResponse {
    /// One vector per input, in input order
    pub embeddings: Vec<Vec<f32>>,
    pub model: String,
    pub usage: TokenUsage,
}
