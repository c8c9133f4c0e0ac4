//! Provider trait definition

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::NormalizedConfig;
use crate::error::{LlmError, Result};
use crate::tools::ToolRegistry;
use crate::types::{
    CancellationToken, ChatMessage, EmbeddingResponse, ProviderMetadata, StructuredDataResponse,
    TextGenerationResponse, ToolChoice,
};

/// Options for text generation
///
/// Unset fields fall back to the provider's normalized config.
#[derive(Clone, Default)]
pub struct GenerateOptions {
    pub model: Option<String>,
    /// Sampling temperature (0.0 - 1.0)
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Sent ahead of every other system message
    pub system_prompt: Option<String>,
    /// Tools the model may call; calls are executed and answered in one follow-up
    pub tools: Option<Arc<ToolRegistry>>,
    /// Defaults to `Auto` when tools are present
    pub tool_choice: Option<ToolChoice>,
    /// Parent token for tool executions
    pub cancel: Option<CancellationToken>,
    /// Call the vendor even when the config is in mock mode
    pub bypass_mock: bool,
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn bypass_mock(mut self) -> Self {
        self.bypass_mock = true;
        self
    }
}

impl std::fmt::Debug for GenerateOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerateOptions")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("system_prompt", &self.system_prompt)
            .field("tools", &self.tools.as_ref().map(|t| t.tool_names()))
            .field("tool_choice", &self.tool_choice)
            .field("bypass_mock", &self.bypass_mock)
            .finish()
    }
}

/// Default function name used to carry structured output
pub const DEFAULT_STRUCTURED_FUNCTION: &str = "structured_output";

/// Options for structured generation
#[derive(Debug, Clone)]
pub struct StructuredOptions {
    /// JSON Schema the result must satisfy
    pub schema: Value,
    /// Name of the single function the model is forced to call
    pub function_name: String,
    pub function_description: String,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub system_prompt: Option<String>,
    pub bypass_mock: bool,
}

impl StructuredOptions {
    pub fn new(schema: Value) -> Self {
        Self {
            schema,
            function_name: DEFAULT_STRUCTURED_FUNCTION.to_string(),
            function_description: "Return the result in the required structure".to_string(),
            model: None,
            temperature: None,
            max_tokens: None,
            system_prompt: None,
            bypass_mock: false,
        }
    }

    /// Options whose schema is derived from `T`
    pub fn for_type<T: JsonSchema>() -> Self {
        let mut schema = schemars::schema_for!(T).to_value();
        if let Some(obj) = schema.as_object_mut() {
            obj.remove("$schema");
        }
        Self::new(schema)
    }

    pub fn with_function(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.function_name = name.into();
        self.function_description = description.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn bypass_mock(mut self) -> Self {
        self.bypass_mock = true;
        self
    }
}

/// Text to embed: one string or a batch
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingInput {
    Single(String),
    Batch(Vec<String>),
}

impl EmbeddingInput {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            EmbeddingInput::Single(s) => vec![s],
            EmbeddingInput::Batch(v) => v,
        }
    }
}

impl From<String> for EmbeddingInput {
    fn from(s: String) -> Self {
        EmbeddingInput::Single(s)
    }
}

impl From<&str> for EmbeddingInput {
    fn from(s: &str) -> Self {
        EmbeddingInput::Single(s.to_string())
    }
}

impl From<Vec<String>> for EmbeddingInput {
    fn from(v: Vec<String>) -> Self {
        EmbeddingInput::Batch(v)
    }
}

impl From<Vec<&str>> for EmbeddingInput {
    fn from(v: Vec<&str>) -> Self {
        EmbeddingInput::Batch(v.into_iter().map(str::to_string).collect())
    }
}

/// Options for embeddings
#[derive(Debug, Clone, Default)]
pub struct EmbeddingOptions {
    /// Overrides the configured embedding model
    pub model: Option<String>,
    pub bypass_mock: bool,
}

impl EmbeddingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn bypass_mock(mut self) -> Self {
        self.bypass_mock = true;
        self
    }
}

/// Provider trait for LLM implementations
///
/// One implementation per vendor family. Instances hold only immutable state
/// and can be shared across tasks.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider tag, e.g. "openai"
    fn name(&self) -> &str;

    fn metadata(&self) -> ProviderMetadata;

    /// Copy of the normalized config this provider was built from
    fn config(&self) -> NormalizedConfig;

    async fn generate_text(
        &self,
        messages: Vec<ChatMessage>,
        options: GenerateOptions,
    ) -> Result<TextGenerationResponse>;

    /// Generate a value that satisfies `options.schema`
    ///
    /// Fails with a structured data error on unparseable or invalid output;
    /// never returns a partial value.
    async fn generate_structured(
        &self,
        messages: Vec<ChatMessage>,
        options: StructuredOptions,
    ) -> Result<StructuredDataResponse<Value>>;

    /// One vector per input, in input order
    async fn generate_embeddings(
        &self,
        input: EmbeddingInput,
        options: EmbeddingOptions,
    ) -> Result<EmbeddingResponse>;
}

/// Typed helpers over [`Provider`]
#[async_trait]
pub trait ProviderExt: Provider {
    /// Structured generation deserialized into `T`
    ///
    /// ```no_run
    /// # async fn run(provider: &dyn unillm_core::providers::Provider) -> unillm_core::Result<()> {
    /// use schemars::JsonSchema;
    /// use serde::Deserialize;
    /// use unillm_core::providers::{ProviderExt, StructuredOptions};
    /// use unillm_core::ChatMessage;
    ///
    /// #[derive(Deserialize, JsonSchema)]
    /// struct Sentiment {
    ///     label: String,
    ///     score: f64,
    /// }
    ///
    /// let sentiment = provider
    ///     .generate_structured_as::<Sentiment>(
    ///         vec![ChatMessage::user("I love this!")],
    ///         StructuredOptions::for_type::<Sentiment>(),
    ///     )
    ///     .await?;
    /// println!("{} ({})", sentiment.data.label, sentiment.data.score);
    /// # Ok(())
    /// # }
    /// ```
    async fn generate_structured_as<T>(
        &self,
        messages: Vec<ChatMessage>,
        options: StructuredOptions,
    ) -> Result<StructuredDataResponse<T>>
    where
        T: DeserializeOwned + Send,
    {
        let response = self.generate_structured(messages, options).await?;
        let raw = response.data.to_string();
        let data = serde_json::from_value(response.data).map_err(|e| {
            LlmError::structured(format!("output does not match the target type: {}", e), Some(raw))
        })?;
        Ok(StructuredDataResponse {
            data,
            model: response.model,
            usage: response.usage,
        })
    }
}

impl<P: Provider + ?Sized> ProviderExt for P {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    struct Person {
        name: String,
        age: u32,
    }

    #[test]
    fn test_for_type_schema() {
        let options = StructuredOptions::for_type::<Person>();
        assert_eq!(options.schema["type"], "object");
        assert!(options.schema["properties"]["name"].is_object());
        assert!(options.schema.get("$schema").is_none());
        assert_eq!(options.function_name, DEFAULT_STRUCTURED_FUNCTION);
    }

    #[test]
    fn test_embedding_input_conversions() {
        assert_eq!(EmbeddingInput::from("a").into_vec(), vec!["a"]);
        assert_eq!(EmbeddingInput::from(vec!["a", "b"]).into_vec(), vec!["a", "b"]);
    }
}
