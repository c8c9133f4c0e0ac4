//! Anthropic Messages API

use serde_json::{json, Value};

use super::adapter::{count, parse_arguments, trim_base, ChatOutput, ChatRequest, VendorAdapter};
use super::client::VendorRequest;
use super::engine::VendorProvider;
use crate::config::{NormalizedConfig, ProviderKind};
use crate::error::{LlmError, Result};
use crate::types::{
    ChatMessage, MessageRole, ProviderCapabilities, ProviderMetadata, TokenUsage, ToolCall,
    ToolChoice,
};

pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic provider; has no embeddings endpoint
pub type AnthropicProvider = VendorProvider<AnthropicAdapter>;

#[derive(Debug, Clone)]
pub struct AnthropicAdapter {
    api_key: String,
    base_url: String,
}

impl VendorAdapter for AnthropicAdapter {
    fn from_config(config: &NormalizedConfig) -> Result<Self> {
        if config.kind() != ProviderKind::Anthropic {
            return Err(LlmError::configuration(format!(
                "expected an anthropic config, got {}",
                config.kind()
            )));
        }
        let api_key = config
            .api_key()
            .ok_or_else(|| LlmError::configuration("anthropic requires an API key"))?;
        Ok(Self {
            api_key: api_key.to_string(),
            base_url: trim_base(config.base_url().unwrap_or(ANTHROPIC_API_BASE)),
        })
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            id: ProviderKind::Anthropic.as_str().to_string(),
            display_name: "Anthropic".to_string(),
            default_api_base: ANTHROPIC_API_BASE.to_string(),
            default_model: ProviderKind::Anthropic
                .default_settings()
                .model
                .unwrap_or_default(),
            default_embedding_model: None,
            capabilities: ProviderCapabilities::without_embeddings(),
        }
    }

    fn chat_request(&self, request: &ChatRequest<'_>) -> Result<VendorRequest> {
        let system: Vec<&str> = request
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .collect();

        let mut body = json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "messages": request
                .messages
                .iter()
                .filter(|m| m.role != MessageRole::System)
                .map(to_wire_message)
                .collect::<Vec<_>>(),
        });
        if !system.is_empty() {
            body["system"] = json!(system.join("\n\n"));
        }

        if !request.tools.is_empty() {
            body["tools"] = request
                .tools
                .iter()
                .map(|def| {
                    json!({
                        "name": def.name,
                        "description": def.description,
                        "input_schema": def.parameters_or_empty(),
                    })
                })
                .collect();
            if let Some(choice) = request.tool_choice {
                body["tool_choice"] = match choice {
                    ToolChoice::Auto => json!({ "type": "auto" }),
                    ToolChoice::None => json!({ "type": "none" }),
                    ToolChoice::Required => json!({ "type": "any" }),
                    ToolChoice::Function(name) => json!({ "type": "tool", "name": name }),
                };
            }
        }

        Ok(VendorRequest::new(format!("{}/v1/messages", self.base_url), body)
            .with_header("x-api-key", &self.api_key)
            .with_header("anthropic-version", ANTHROPIC_VERSION))
    }

    fn parse_chat(&self, body: &Value) -> Result<ChatOutput> {
        let blocks = body
            .get("content")
            .and_then(Value::as_array)
            .ok_or_else(|| LlmError::api("anthropic", None, "response has no content"))?;

        let mut output = ChatOutput {
            model: body["model"].as_str().map(str::to_string),
            usage: TokenUsage::new(
                count(body, "/usage/input_tokens"),
                count(body, "/usage/output_tokens"),
            ),
            ..Default::default()
        };
        for block in blocks {
            match block["type"].as_str() {
                Some("text") => output.content.push_str(block["text"].as_str().unwrap_or_default()),
                Some("tool_use") => output.tool_calls.push(ToolCall {
                    id: block["id"].as_str().unwrap_or_default().to_string(),
                    name: block["name"].as_str().unwrap_or_default().to_string(),
                    arguments: parse_arguments(&block["input"]),
                }),
                _ => {}
            }
        }
        Ok(output)
    }
}

/// Tool results travel as user turns; function results become plain user text
fn to_wire_message(message: &ChatMessage) -> Value {
    match message.role {
        MessageRole::Assistant if !message.calls().is_empty() => {
            let mut content = Vec::new();
            if !message.content.is_empty() {
                content.push(json!({ "type": "text", "text": message.content }));
            }
            content.extend(message.calls().iter().map(|call| {
                json!({
                    "type": "tool_use",
                    "id": call.id,
                    "name": call.name,
                    "input": call.arguments,
                })
            }));
            json!({ "role": "assistant", "content": content })
        }
        MessageRole::Assistant => json!({ "role": "assistant", "content": message.content }),
        MessageRole::Tool => json!({
            "role": "user",
            "content": [{
                "type": "tool_result",
                "tool_use_id": message.tool_call_id.as_deref().unwrap_or_default(),
                "content": message.content,
            }]
        }),
        MessageRole::Function => json!({
            "role": "user",
            "content": format!("{}: {}", message.name.as_deref().unwrap_or("function"), message.content),
        }),
        MessageRole::User | MessageRole::System => {
            json!({ "role": "user", "content": message.content })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigValidator, ProviderConfig};
    use crate::error::ErrorKind;
    use crate::logging::NoOpLogger;
    use crate::providers::engine::testing::ScriptedClient;
    use crate::providers::{EmbeddingOptions, GenerateOptions, Provider};
    use crate::secrets::MemorySecretStore;
    use crate::types::FunctionDefinition;
    use std::sync::Arc;

    fn normalized(config: ProviderConfig) -> NormalizedConfig {
        ConfigValidator::with_secret_store(Arc::new(MemorySecretStore::new()))
            .validate(config)
            .unwrap()
    }

    #[test]
    fn test_request_shape() {
        let adapter = AnthropicAdapter::from_config(&normalized(ProviderConfig::anthropic("ak"))).unwrap();
        let messages = vec![
            ChatMessage::system("one"),
            ChatMessage::system("two"),
            ChatMessage::user("hi"),
            ChatMessage::assistant_tool_calls("", vec![ToolCall::new("tu_1", "add", json!({ "a": 1 }))]),
            ChatMessage::tool("tu_1", "add", "2"),
        ];
        let tools = vec![FunctionDefinition::new("add", "Add", json!({ "type": "object" }))];
        let choice = ToolChoice::Function("add".into());

        let request = adapter
            .chat_request(&ChatRequest {
                model: "claude-3-5-sonnet-latest",
                messages: &messages,
                temperature: 0.5,
                max_tokens: 1024,
                tools: &tools,
                tool_choice: Some(&choice),
            })
            .unwrap();

        assert_eq!(request.url, "https://api.anthropic.com/v1/messages");
        assert_eq!(request.header("x-api-key"), Some("ak"));
        assert_eq!(request.header("anthropic-version"), Some("2023-06-01"));
        assert_eq!(request.body["system"], "one\n\ntwo");
        let wire = request.body["messages"].as_array().unwrap();
        assert_eq!(wire.len(), 3);
        assert_eq!(wire[1]["content"][0]["type"], "tool_use");
        assert_eq!(wire[2]["role"], "user");
        assert_eq!(wire[2]["content"][0]["tool_use_id"], "tu_1");
        assert_eq!(request.body["tools"][0]["input_schema"]["type"], "object");
        assert_eq!(request.body["tool_choice"], json!({ "type": "tool", "name": "add" }));
    }

    #[test]
    fn test_parse_text_and_tool_use() {
        let adapter = AnthropicAdapter::from_config(&normalized(ProviderConfig::anthropic("ak"))).unwrap();
        let body = json!({
            "model": "claude-3-5-sonnet-20241022",
            "content": [
                { "type": "text", "text": "Let me add that." },
                { "type": "tool_use", "id": "toolu_01", "name": "add", "input": { "a": 3, "b": 7 } }
            ],
            "usage": { "input_tokens": 30, "output_tokens": 12 }
        });
        let output = adapter.parse_chat(&body).unwrap();
        assert_eq!(output.content, "Let me add that.");
        assert_eq!(output.tool_calls[0].arguments, json!({ "a": 3, "b": 7 }));
        assert_eq!(output.usage, TokenUsage::new(30, 12));
    }

    #[tokio::test]
    async fn test_embeddings_unsupported_even_in_mock_mode() {
        for config in [ProviderConfig::anthropic("ak"), ProviderConfig::anthropic("ak").mock()] {
            let client = Arc::new(ScriptedClient::default());
            let provider =
                AnthropicProvider::new(normalized(config), client.clone(), Arc::new(NoOpLogger)).unwrap();
            let err = provider
                .generate_embeddings("hello".into(), EmbeddingOptions::new())
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);
            assert!(client.requests().is_empty());
        }
    }

    #[tokio::test]
    async fn test_overloaded_maps_to_api_error() {
        let client = Arc::new(ScriptedClient::new([Err(
            crate::providers::VendorError::status(529, "Overloaded"),
        )]));
        let provider = AnthropicProvider::new(
            normalized(ProviderConfig::anthropic("ak")),
            client,
            Arc::new(NoOpLogger),
        )
        .unwrap();
        let err = provider
            .generate_text(vec![ChatMessage::user("hi")], GenerateOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Api { status: Some(529), .. }));
    }
}
