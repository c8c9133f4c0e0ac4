//! Shared provider flow
//!
//! [`VendorProvider`] implements [`Provider`] once for every vendor: option
//! merging, mock mode, the tool-call round trip, structured output
//! validation and embeddings batching. The adapter only translates wire
//! formats.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::adapter::{ChatOutput, ChatRequest, VendorAdapter};
use super::client::{map_vendor_error, VendorClient, VendorRequest};
use super::mock::{mock_embedding, mock_text, mock_value};
use super::traits::{EmbeddingInput, EmbeddingOptions, GenerateOptions, Provider, StructuredOptions};
use crate::config::{apply_defaults, check_ranges, CommonSettings, ExecutionMode, NormalizedConfig};
use crate::error::{LlmError, Result};
use crate::logging::Logger;
use crate::schema;
use crate::tools::ExecuteOptions;
use crate::types::{
    hoist_system_messages, ChatMessage, EmbeddingResponse, FunctionDefinition, ProviderMetadata,
    StructuredDataResponse, TextGenerationResponse, TokenUsage, ToolChoice,
};

/// A provider for one vendor family
pub struct VendorProvider<A> {
    name: String,
    adapter: A,
    config: NormalizedConfig,
    client: Arc<dyn VendorClient>,
    logger: Arc<dyn Logger>,
}

/// Per-call settings after merging options over the config
struct Settings {
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl<A: VendorAdapter> VendorProvider<A> {
    /// Build around a validated config
    ///
    /// Fails with a configuration error when `config` is for another vendor.
    pub fn new(
        config: NormalizedConfig,
        client: Arc<dyn VendorClient>,
        logger: Arc<dyn Logger>,
    ) -> Result<Self> {
        let adapter = A::from_config(&config)?;
        let name = adapter.metadata().id;
        Ok(Self {
            name,
            adapter,
            config,
            client,
            logger,
        })
    }

    fn is_mock(&self, bypass_mock: bool) -> bool {
        self.config.execution_mode() == ExecutionMode::Mock && !bypass_mock
    }

    fn settings(
        &self,
        model: Option<&String>,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> Result<Settings> {
        let overrides = CommonSettings {
            model: model.cloned(),
            temperature,
            max_tokens,
            execution_mode: self.config.execution_mode(),
            ..Default::default()
        };
        let merged = apply_defaults(self.config.config().common(), &overrides);
        check_ranges(&merged)?;
        Ok(Settings {
            model: merged.model.unwrap_or_else(|| self.config.model().to_string()),
            temperature: merged.temperature.unwrap_or_else(|| self.config.temperature()),
            max_tokens: merged.max_tokens.unwrap_or_else(|| self.config.max_tokens()),
        })
    }

    async fn dispatch(&self, request: VendorRequest) -> Result<Value> {
        crate::log_debug!(self.logger, "[{}] POST {}", self.name, request.url);
        self.client.send(request).await.map_err(|e| {
            let err = map_vendor_error(&self.name, e);
            crate::log_error!(self.logger, "[{}] {}", self.name, err);
            err
        })
    }

    async fn chat(&self, request: &ChatRequest<'_>) -> Result<ChatOutput> {
        let vendor_request = self.adapter.chat_request(request)?;
        let body = self.dispatch(vendor_request).await?;
        self.adapter.parse_chat(&body)
    }
}

fn with_system_prompt(messages: Vec<ChatMessage>, prompt: Option<String>) -> Vec<ChatMessage> {
    let mut messages = hoist_system_messages(messages);
    if let Some(prompt) = prompt {
        messages.insert(0, ChatMessage::system(prompt));
    }
    messages
}

#[async_trait]
impl<A: VendorAdapter> Provider for VendorProvider<A> {
    fn name(&self) -> &str {
        &self.name
    }

    fn metadata(&self) -> ProviderMetadata {
        self.adapter.metadata()
    }

    fn config(&self) -> NormalizedConfig {
        self.config.clone()
    }

    async fn generate_text(
        &self,
        messages: Vec<ChatMessage>,
        options: GenerateOptions,
    ) -> Result<TextGenerationResponse> {
        let settings = self.settings(options.model.as_ref(), options.temperature, options.max_tokens)?;

        if self.is_mock(options.bypass_mock) {
            return Ok(TextGenerationResponse {
                content: mock_text(&messages),
                model: settings.model,
                usage: TokenUsage::default(),
                tool_results: Vec::new(),
            });
        }

        crate::log_info!(
            self.logger,
            "[{}] generate_text: model={}, messages={}",
            self.name,
            settings.model,
            messages.len()
        );

        let mut messages = with_system_prompt(messages, options.system_prompt);
        let definitions = options
            .tools
            .as_ref()
            .map(|registry| registry.function_definitions())
            .unwrap_or_default();
        let tool_choice = options.tool_choice.unwrap_or_default();

        let first = self
            .chat(&ChatRequest {
                model: &settings.model,
                messages: &messages,
                temperature: settings.temperature,
                max_tokens: settings.max_tokens,
                tools: &definitions,
                tool_choice: (!definitions.is_empty()).then_some(&tool_choice),
            })
            .await?;

        let registry = match &options.tools {
            Some(registry) if !first.tool_calls.is_empty() => registry,
            _ => {
                if !first.tool_calls.is_empty() {
                    crate::log_warn!(
                        self.logger,
                        "[{}] model requested {} tool call(s) but no tools were supplied",
                        self.name,
                        first.tool_calls.len()
                    );
                }
                return Ok(TextGenerationResponse {
                    content: first.content,
                    model: first.model.unwrap_or(settings.model),
                    usage: first.usage,
                    tool_results: Vec::new(),
                });
            }
        };

        let mut execute = ExecuteOptions::new();
        if let Some(cancel) = options.cancel {
            execute = execute.with_cancel(cancel);
        }
        let tool_results = registry.execute_tool_calls(&first.tool_calls, execute).await;

        for (call, result) in first.tool_calls.iter().zip(&tool_results) {
            messages.push(ChatMessage::assistant_tool_calls("", vec![call.clone()]));
            messages.push(ChatMessage::tool(
                &call.id,
                &call.name,
                result.to_message_content(),
            ));
        }

        // Single follow-up; tools stay declared but may not be called again
        let follow_up = self
            .chat(&ChatRequest {
                model: &settings.model,
                messages: &messages,
                temperature: settings.temperature,
                max_tokens: settings.max_tokens,
                tools: &definitions,
                tool_choice: Some(&ToolChoice::None),
            })
            .await?;

        let mut usage = first.usage;
        usage.accumulate(follow_up.usage);
        Ok(TextGenerationResponse {
            content: follow_up.content,
            model: follow_up.model.or(first.model).unwrap_or(settings.model),
            usage,
            tool_results,
        })
    }

    async fn generate_structured(
        &self,
        messages: Vec<ChatMessage>,
        options: StructuredOptions,
    ) -> Result<StructuredDataResponse<Value>> {
        let settings = self.settings(options.model.as_ref(), options.temperature, options.max_tokens)?;
        schema::check_schema(&options.schema).map_err(|msg| LlmError::structured(msg, None))?;

        if self.is_mock(options.bypass_mock) {
            let data = mock_value(&options.schema);
            schema::validate(&options.schema, &data)
                .map_err(|msg| LlmError::structured(msg, Some(data.to_string())))?;
            return Ok(StructuredDataResponse {
                data,
                model: settings.model,
                usage: TokenUsage::default(),
            });
        }

        crate::log_info!(
            self.logger,
            "[{}] generate_structured: model={}, function={}",
            self.name,
            settings.model,
            options.function_name
        );

        let messages = with_system_prompt(messages, options.system_prompt);
        let definition = FunctionDefinition::new(
            &options.function_name,
            &options.function_description,
            options.schema.clone(),
        );
        let choice = ToolChoice::Function(options.function_name.clone());

        let output = self
            .chat(&ChatRequest {
                model: &settings.model,
                messages: &messages,
                temperature: settings.temperature,
                max_tokens: settings.max_tokens,
                tools: std::slice::from_ref(&definition),
                tool_choice: Some(&choice),
            })
            .await?;

        let call = output
            .tool_calls
            .into_iter()
            .find(|c| c.name == options.function_name)
            .ok_or_else(|| {
                LlmError::structured(
                    format!("model did not call '{}'", options.function_name),
                    (!output.content.is_empty()).then(|| output.content.clone()),
                )
            })?;

        let data = match call.arguments {
            Value::String(raw) => {
                return Err(LlmError::structured("function arguments are not valid JSON", Some(raw)));
            }
            value => value,
        };
        if let Err(msg) = schema::validate(&options.schema, &data) {
            crate::log_warn!(self.logger, "[{}] structured output rejected: {}", self.name, msg);
            return Err(LlmError::structured(msg, Some(data.to_string())));
        }

        Ok(StructuredDataResponse {
            data,
            model: output.model.unwrap_or(settings.model),
            usage: output.usage,
        })
    }

    async fn generate_embeddings(
        &self,
        input: EmbeddingInput,
        options: EmbeddingOptions,
    ) -> Result<EmbeddingResponse> {
        let metadata = self.adapter.metadata();
        if !metadata.capabilities.embeddings {
            return Err(LlmError::unsupported(&self.name, "embeddings"));
        }

        let inputs = input.into_vec();
        if inputs.is_empty() {
            return Err(LlmError::Embeddings("input is empty".to_string()));
        }
        let model = options
            .model
            .or_else(|| self.config.embedding_model().map(str::to_string))
            .ok_or_else(|| LlmError::Embeddings(format!("{} has no embedding model configured", self.name)))?;

        if self.is_mock(options.bypass_mock) {
            return Ok(EmbeddingResponse {
                embeddings: inputs.iter().map(|text| mock_embedding(text)).collect(),
                model,
                usage: TokenUsage::default(),
            });
        }

        crate::log_info!(
            self.logger,
            "[{}] generate_embeddings: model={}, inputs={}",
            self.name,
            model,
            inputs.len()
        );

        let request = self.adapter.embeddings_request(&inputs, &model)?;
        let body = self.dispatch(request).await?;
        let output = self.adapter.parse_embeddings(&body)?;
        if output.embeddings.len() != inputs.len() {
            return Err(LlmError::Embeddings(format!(
                "{} returned {} embeddings for {} inputs",
                self.name,
                output.embeddings.len(),
                inputs.len()
            )));
        }

        Ok(EmbeddingResponse {
            embeddings: output.embeddings,
            model,
            usage: output.usage,
        })
    }
}

impl<A> std::fmt::Debug for VendorProvider<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VendorProvider")
            .field("name", &self.name)
            .field("model", &self.config.model())
            .field("execution_mode", &self.config.execution_mode())
            .finish_non_exhaustive()
    }
}
