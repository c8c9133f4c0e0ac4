//! OpenAI chat completions and embeddings
//!
//! The wire helpers here are shared with the Azure adapter, which speaks the
//! same format on different URLs.

use serde_json::{json, Map, Value};

use super::adapter::{
    count, parse_arguments, to_vector, trim_base, ChatOutput, ChatRequest, EmbeddingsOutput,
    VendorAdapter,
};
use super::client::VendorRequest;
use super::engine::VendorProvider;
use crate::config::{NormalizedConfig, ProviderConfig, ProviderKind};
use crate::error::{LlmError, Result};
use crate::types::{
    ChatMessage, MessageRole, ProviderCapabilities, ProviderMetadata, TokenUsage, ToolCall,
    ToolChoice,
};

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// OpenAI provider
pub type OpenAiProvider = VendorProvider<OpenAiAdapter>;

#[derive(Debug, Clone)]
pub struct OpenAiAdapter {
    api_key: String,
    base_url: String,
    organization: Option<String>,
}

impl VendorAdapter for OpenAiAdapter {
    fn from_config(config: &NormalizedConfig) -> Result<Self> {
        let ProviderConfig::OpenAi(openai) = config.config() else {
            return Err(LlmError::configuration(format!(
                "expected an openai config, got {}",
                config.kind()
            )));
        };
        let api_key = config
            .api_key()
            .ok_or_else(|| LlmError::configuration("openai requires an API key"))?;
        Ok(Self {
            api_key: api_key.to_string(),
            base_url: trim_base(config.base_url().unwrap_or(OPENAI_API_BASE)),
            organization: openai.organization.clone(),
        })
    }

    fn metadata(&self) -> ProviderMetadata {
        let defaults = ProviderKind::OpenAi.default_settings();
        ProviderMetadata {
            id: ProviderKind::OpenAi.as_str().to_string(),
            display_name: "OpenAI".to_string(),
            default_api_base: OPENAI_API_BASE.to_string(),
            default_model: defaults.model.unwrap_or_default(),
            default_embedding_model: defaults.embedding_model,
            capabilities: ProviderCapabilities::full(),
        }
    }

    fn chat_request(&self, request: &ChatRequest<'_>) -> Result<VendorRequest> {
        let mut body = chat_body(request);
        body["model"] = json!(request.model);
        Ok(self.authorized(format!("{}/chat/completions", self.base_url), body))
    }

    fn parse_chat(&self, body: &Value) -> Result<ChatOutput> {
        parse_chat_body("openai", body)
    }

    fn embeddings_request(&self, inputs: &[String], model: &str) -> Result<VendorRequest> {
        Ok(self.authorized(
            format!("{}/embeddings", self.base_url),
            json!({ "model": model, "input": inputs }),
        ))
    }

    fn parse_embeddings(&self, body: &Value) -> Result<EmbeddingsOutput> {
        parse_embeddings_body("openai", body)
    }
}

impl OpenAiAdapter {
    fn authorized(&self, url: String, body: Value) -> VendorRequest {
        let request = VendorRequest::new(url, body)
            .with_header("Authorization", format!("Bearer {}", self.api_key));
        match &self.organization {
            Some(org) => request.with_header("OpenAI-Organization", org),
            None => request,
        }
    }
}

/// Chat completions body without `model`
pub(crate) fn chat_body(request: &ChatRequest<'_>) -> Value {
    let mut body = json!({
        "messages": request.messages.iter().map(to_wire_message).collect::<Vec<_>>(),
        "temperature": request.temperature,
        "max_tokens": request.max_tokens,
    });

    if !request.tools.is_empty() {
        body["tools"] = request
            .tools
            .iter()
            .map(|def| {
                json!({
                    "type": "function",
                    "function": {
                        "name": def.name,
                        "description": def.description,
                        "parameters": def.parameters_or_empty(),
                    }
                })
            })
            .collect();
        if let Some(choice) = request.tool_choice {
            body["tool_choice"] = match choice {
                ToolChoice::Auto => json!("auto"),
                ToolChoice::None => json!("none"),
                ToolChoice::Required => json!("required"),
                ToolChoice::Function(name) => {
                    json!({ "type": "function", "function": { "name": name } })
                }
            };
        }
    }
    body
}

fn to_wire_message(message: &ChatMessage) -> Value {
    let mut wire = Map::new();
    wire.insert("role".into(), json!(message.role.to_string()));

    match message.role {
        MessageRole::Assistant if !message.calls().is_empty() => {
            let content = if message.content.is_empty() {
                Value::Null
            } else {
                json!(message.content)
            };
            wire.insert("content".into(), content);
            wire.insert(
                "tool_calls".into(),
                message
                    .calls()
                    .iter()
                    .map(|call| {
                        json!({
                            "id": call.id,
                            "type": "function",
                            "function": {
                                "name": call.name,
                                "arguments": call.arguments.to_string(),
                            }
                        })
                    })
                    .collect(),
            );
        }
        MessageRole::Tool => {
            wire.insert("content".into(), json!(message.content));
            if let Some(id) = &message.tool_call_id {
                wire.insert("tool_call_id".into(), json!(id));
            }
        }
        _ => {
            wire.insert("content".into(), json!(message.content));
            if let Some(name) = &message.name {
                wire.insert("name".into(), json!(name));
            }
        }
    }
    Value::Object(wire)
}

pub(crate) fn parse_chat_body(provider: &str, body: &Value) -> Result<ChatOutput> {
    let message = body
        .pointer("/choices/0/message")
        .ok_or_else(|| LlmError::api(provider, None, "response has no choices"))?;

    let tool_calls = message
        .get("tool_calls")
        .and_then(Value::as_array)
        .map(|calls| {
            calls
                .iter()
                .map(|call| ToolCall {
                    id: call["id"].as_str().unwrap_or_default().to_string(),
                    name: call
                        .pointer("/function/name")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    arguments: parse_arguments(
                        call.pointer("/function/arguments").unwrap_or(&Value::Null),
                    ),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(ChatOutput {
        content: message["content"].as_str().unwrap_or_default().to_string(),
        tool_calls,
        usage: TokenUsage {
            prompt_tokens: count(body, "/usage/prompt_tokens"),
            completion_tokens: count(body, "/usage/completion_tokens"),
            total_tokens: count(body, "/usage/total_tokens"),
        },
        model: body["model"].as_str().map(str::to_string),
    })
}

pub(crate) fn parse_embeddings_body(provider: &str, body: &Value) -> Result<EmbeddingsOutput> {
    let data = body
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| LlmError::Embeddings(format!("{} response has no data", provider)))?;

    let mut indexed = data
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let index = item["index"].as_u64().map(|n| n as usize).unwrap_or(i);
            to_vector(provider, item.get("embedding")).map(|v| (index, v))
        })
        .collect::<Result<Vec<_>>>()?;
    indexed.sort_by_key(|(index, _)| *index);

    Ok(EmbeddingsOutput {
        embeddings: indexed.into_iter().map(|(_, v)| v).collect(),
        usage: TokenUsage {
            prompt_tokens: count(body, "/usage/prompt_tokens"),
            completion_tokens: 0,
            total_tokens: count(body, "/usage/total_tokens"),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigValidator;
    use crate::secrets::MemorySecretStore;
    use crate::types::FunctionDefinition;
    use std::sync::Arc;

    fn adapter(config: ProviderConfig) -> OpenAiAdapter {
        let normalized = ConfigValidator::with_secret_store(Arc::new(MemorySecretStore::new()))
            .validate(config)
            .unwrap();
        OpenAiAdapter::from_config(&normalized).unwrap()
    }

    #[test]
    fn test_chat_request_shape() {
        let adapter = adapter(ProviderConfig::openai("sk-test").with_base_url("https://proxy.local/v1/"));
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("hi")];
        let tools = vec![FunctionDefinition::new("lookup", "Look up", Value::Null)];
        let choice = ToolChoice::Required;

        let request = adapter
            .chat_request(&ChatRequest {
                model: "gpt-4o",
                messages: &messages,
                temperature: 0.2,
                max_tokens: 256,
                tools: &tools,
                tool_choice: Some(&choice),
            })
            .unwrap();

        assert_eq!(request.url, "https://proxy.local/v1/chat/completions");
        assert_eq!(request.header("authorization"), Some("Bearer sk-test"));
        assert_eq!(request.body["model"], "gpt-4o");
        assert_eq!(request.body["max_tokens"], 256);
        assert_eq!(request.body["messages"][0]["role"], "system");
        assert_eq!(request.body["tool_choice"], "required");
        assert_eq!(
            request.body["tools"][0]["function"]["parameters"],
            json!({ "type": "object", "properties": {} })
        );
    }

    #[test]
    fn test_organization_header() {
        let mut config = ProviderConfig::openai("sk-test");
        if let ProviderConfig::OpenAi(openai) = &mut config {
            openai.organization = Some("org-123".into());
        }
        let request = adapter(config)
            .embeddings_request(&["a".to_string()], "text-embedding-3-small")
            .unwrap();
        assert_eq!(request.header("OpenAI-Organization"), Some("org-123"));
        assert_eq!(request.url, "https://api.openai.com/v1/embeddings");
        assert_eq!(request.body["input"], json!(["a"]));
    }

    #[test]
    fn test_parse_tool_calls() {
        let body = json!({
            "model": "gpt-4o",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": { "name": "get_weather", "arguments": "{\"city\":\"Paris\"}" }
                    }]
                }
            }]
        });
        let output = parse_chat_body("openai", &body).unwrap();
        assert_eq!(output.content, "");
        assert_eq!(output.tool_calls[0].id, "call_abc");
        assert_eq!(output.tool_calls[0].get_arg_str("city"), Some("Paris"));
        assert_eq!(output.usage, TokenUsage::default());
    }

    #[test]
    fn test_parse_without_choices() {
        let err = parse_chat_body("openai", &json!({ "choices": [] })).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Api);
    }

    #[test]
    fn test_parse_embeddings_ordered_by_index() {
        let body = json!({
            "data": [
                { "index": 1, "embedding": [0.0, 1.0] },
                { "index": 0, "embedding": [1.0, 0.0] }
            ],
            "usage": { "prompt_tokens": 4, "total_tokens": 4 }
        });
        let output = parse_embeddings_body("openai", &body).unwrap();
        assert_eq!(output.embeddings, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        assert_eq!(output.usage.total_tokens, 4);
    }

    #[test]
    fn test_assistant_tool_call_message() {
        let message = ChatMessage::assistant_tool_calls(
            "",
            vec![ToolCall::new("call_1", "add", json!({ "a": 1 }))],
        );
        let wire = to_wire_message(&message);
        assert_eq!(wire["content"], Value::Null);
        assert_eq!(wire["tool_calls"][0]["function"]["arguments"], "{\"a\":1}");
    }
}
