//! UniLLM Core
//!
//! Provider-agnostic LLM abstractions. One [`Provider`] interface covers
//! OpenAI, Azure OpenAI, Anthropic and Google for text generation,
//! schema-validated structured output and embeddings.
//!
//! ## Tool Execution
//!
//! Tools registered in a [`ToolRegistry`] are advertised to the model and
//! run when it asks for them, with input validation, timeouts and
//! cooperative cancellation:
//!
//! ```rust,ignore
//! use unillm_core::{create_provider, ChatMessage, GenerateOptions, ProviderConfig, Tool, ToolRegistry};
//!
//! let registry = Arc::new(ToolRegistry::new(Arc::new(NoOpLogger)));
//! registry.register(Tool::from_fn("add", "Add two numbers", schema, |input, _cancel| async move {
//!     Ok(json!(input["a"].as_f64().unwrap_or(0.0) + input["b"].as_f64().unwrap_or(0.0)))
//! }))?;
//!
//! let provider = create_provider(ProviderConfig::openai(key), logger)?;
//! let response = provider
//!     .generate_text(vec![ChatMessage::user("What is 3 + 7?")], GenerateOptions::new().with_tools(registry))
//!     .await?;
//! ```

pub mod config;
pub mod embeddings;
pub mod error;
pub mod logging;
pub mod providers;
pub mod schema;
pub mod secrets;
pub mod tools;
pub mod types;

pub use error::{BoxError, ErrorKind, LlmError, Result};

pub use types::{
    CancellationToken, ChatMessage, EmbeddingResponse, FunctionDefinition, MessageRole,
    ProviderCapabilities, ProviderMetadata, StructuredDataResponse, TextGenerationResponse,
    TokenUsage, ToolCall, ToolChoice,
};

pub use config::{
    ConfigValidator, ExecutionMode, FileConfigProvider, NormalizedConfig, ProviderConfig,
    ProviderKind,
};

pub use secrets::{EnvSecretStore, MemorySecretStore, SecretStore, SecretStoreError};

pub use logging::{ConsoleLogger, LogLevel, Logger, NoOpLogger};

pub use providers::{
    create_provider, create_provider_with_client, supported_providers, EmbeddingInput,
    EmbeddingOptions, GenerateOptions, HttpVendorClient, Provider, ProviderExt,
    StructuredOptions, VendorClient,
};

pub use tools::{ExecuteOptions, Tool, ToolCallStatus, ToolHandler, ToolRegistry, ToolResult};

pub use embeddings::{cosine_similarity, find_similar_embeddings, EmbeddingCandidate, SimilarityMatch};
