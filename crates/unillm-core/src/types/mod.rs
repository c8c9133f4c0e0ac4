//! Core types for LLM interactions
//!
//! This module contains all the shared types used across providers.

mod message;
mod model;
mod tool;
mod response;
mod cancellation;

pub use message::{ChatMessage, MessageRole, hoist_system_messages, last_user_text};
pub use model::{ProviderCapabilities, ProviderMetadata};
pub use tool::{FunctionDefinition, ToolCall, ToolChoice};
pub use response::{EmbeddingResponse, StructuredDataResponse, TextGenerationResponse, TokenUsage};
pub use cancellation::CancellationToken;
