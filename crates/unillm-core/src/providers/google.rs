//! Google Gemini
//!
//! With an API key requests go to the Generative Language API. With a
//! service-account triple they go to Vertex AI and the injected
//! [`VendorClient`](super::VendorClient) is responsible for the OAuth token.

use serde_json::{json, Map, Value};

use super::adapter::{
    count, parse_arguments, to_vector, trim_base, ChatOutput, ChatRequest, EmbeddingsOutput,
    VendorAdapter,
};
use super::client::VendorRequest;
use super::engine::VendorProvider;
use crate::config::{NormalizedConfig, ProviderConfig, ProviderKind, DEFAULT_GOOGLE_LOCATION};
use crate::error::{LlmError, Result};
use crate::types::{
    ChatMessage, MessageRole, ProviderCapabilities, ProviderMetadata, TokenUsage, ToolCall,
    ToolChoice,
};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Schema keywords Gemini function declarations reject
const UNSUPPORTED_SCHEMA_KEYS: [&str; 4] =
    ["$schema", "additionalProperties", "$defs", "definitions"];

/// Google provider
pub type GoogleProvider = VendorProvider<GoogleAdapter>;

#[derive(Debug, Clone)]
enum Endpoint {
    ApiKey { api_key: String, base_url: String },
    Vertex { project_id: String, location: String },
}

#[derive(Debug, Clone)]
pub struct GoogleAdapter {
    endpoint: Endpoint,
}

impl VendorAdapter for GoogleAdapter {
    fn from_config(config: &NormalizedConfig) -> Result<Self> {
        let ProviderConfig::Google(google) = config.config() else {
            return Err(LlmError::configuration(format!(
                "expected a google config, got {}",
                config.kind()
            )));
        };

        let endpoint = match (config.api_key(), &google.project_id) {
            (Some(api_key), _) => Endpoint::ApiKey {
                api_key: api_key.to_string(),
                base_url: trim_base(config.base_url().unwrap_or(GEMINI_API_BASE)),
            },
            (None, Some(project_id)) if google.has_service_account() => Endpoint::Vertex {
                project_id: project_id.clone(),
                location: google
                    .location
                    .clone()
                    .unwrap_or_else(|| DEFAULT_GOOGLE_LOCATION.to_string()),
            },
            _ => {
                return Err(LlmError::configuration(
                    "google requires an API key or service-account credentials",
                ))
            }
        };
        Ok(Self { endpoint })
    }

    fn metadata(&self) -> ProviderMetadata {
        let defaults = ProviderKind::Google.default_settings();
        ProviderMetadata {
            id: ProviderKind::Google.as_str().to_string(),
            display_name: "Google Gemini".to_string(),
            default_api_base: GEMINI_API_BASE.to_string(),
            default_model: defaults.model.unwrap_or_default(),
            default_embedding_model: defaults.embedding_model,
            capabilities: ProviderCapabilities::full(),
        }
    }

    fn chat_request(&self, request: &ChatRequest<'_>) -> Result<VendorRequest> {
        let system: Vec<Value> = request
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| json!({ "text": m.content }))
            .collect();

        let mut body = json!({
            "contents": request
                .messages
                .iter()
                .filter(|m| m.role != MessageRole::System)
                .map(to_wire_content)
                .collect::<Vec<_>>(),
            "generationConfig": {
                "temperature": request.temperature,
                "maxOutputTokens": request.max_tokens,
            },
        });
        if !system.is_empty() {
            body["systemInstruction"] = json!({ "parts": system });
        }

        if !request.tools.is_empty() {
            let declarations: Vec<Value> = request
                .tools
                .iter()
                .map(|def| {
                    json!({
                        "name": def.name,
                        "description": def.description,
                        "parameters": function_parameters(def.parameters_or_empty()),
                    })
                })
                .collect();
            body["tools"] = json!([{ "functionDeclarations": declarations }]);

            if let Some(choice) = request.tool_choice {
                body["toolConfig"] = json!({
                    "functionCallingConfig": match choice {
                        ToolChoice::Auto => json!({ "mode": "AUTO" }),
                        ToolChoice::None => json!({ "mode": "NONE" }),
                        ToolChoice::Required => json!({ "mode": "ANY" }),
                        ToolChoice::Function(name) => {
                            json!({ "mode": "ANY", "allowedFunctionNames": [name] })
                        }
                    }
                });
            }
        }

        Ok(self.request(request.model, "generateContent", body))
    }

    fn parse_chat(&self, body: &Value) -> Result<ChatOutput> {
        let parts = body
            .pointer("/candidates/0/content/parts")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                let reason = body
                    .pointer("/promptFeedback/blockReason")
                    .and_then(Value::as_str)
                    .unwrap_or("response has no candidates");
                LlmError::api("google", None, reason)
            })?;

        let mut output = ChatOutput {
            model: body["modelVersion"].as_str().map(str::to_string),
            usage: TokenUsage {
                prompt_tokens: count(body, "/usageMetadata/promptTokenCount"),
                completion_tokens: count(body, "/usageMetadata/candidatesTokenCount"),
                total_tokens: count(body, "/usageMetadata/totalTokenCount"),
            },
            ..Default::default()
        };
        for (i, part) in parts.iter().enumerate() {
            if let Some(text) = part["text"].as_str() {
                output.content.push_str(text);
            }
            if let Some(call) = part.get("functionCall") {
                let name = call["name"].as_str().unwrap_or_default().to_string();
                output.tool_calls.push(ToolCall {
                    // Gemini ids are optional; synthesize a stable one
                    id: call["id"]
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("{}_{}", name, i)),
                    name,
                    arguments: parse_arguments(&call["args"]),
                });
            }
        }
        Ok(output)
    }

    fn embeddings_request(&self, inputs: &[String], model: &str) -> Result<VendorRequest> {
        match &self.endpoint {
            Endpoint::ApiKey { .. } => {
                let requests: Vec<Value> = inputs
                    .iter()
                    .map(|text| {
                        json!({
                            "model": format!("models/{}", model),
                            "content": { "parts": [{ "text": text }] },
                        })
                    })
                    .collect();
                Ok(self.request(model, "batchEmbedContents", json!({ "requests": requests })))
            }
            Endpoint::Vertex { .. } => {
                let instances: Vec<Value> =
                    inputs.iter().map(|text| json!({ "content": text })).collect();
                Ok(self.request(model, "predict", json!({ "instances": instances })))
            }
        }
    }

    fn parse_embeddings(&self, body: &Value) -> Result<EmbeddingsOutput> {
        let (items, pointer) = match &self.endpoint {
            Endpoint::ApiKey { .. } => (body.get("embeddings"), "/values"),
            Endpoint::Vertex { .. } => (body.get("predictions"), "/embeddings/values"),
        };
        let items = items
            .and_then(Value::as_array)
            .ok_or_else(|| LlmError::Embeddings("google response has no embeddings".to_string()))?;

        Ok(EmbeddingsOutput {
            embeddings: items
                .iter()
                .map(|item| to_vector("google", item.pointer(pointer)))
                .collect::<Result<Vec<_>>>()?,
            usage: TokenUsage::default(),
        })
    }
}

impl GoogleAdapter {
    fn request(&self, model: &str, method: &str, body: Value) -> VendorRequest {
        match &self.endpoint {
            Endpoint::ApiKey { api_key, base_url } => VendorRequest::new(
                format!("{}/v1beta/models/{}:{}", base_url, model, method),
                body,
            )
            .with_header("x-goog-api-key", api_key),
            Endpoint::Vertex {
                project_id,
                location,
            } => VendorRequest::new(
                format!(
                    "https://{loc}-aiplatform.googleapis.com/v1/projects/{project}/locations/{loc}/publishers/google/models/{model}:{method}",
                    loc = location,
                    project = project_id,
                    model = model,
                    method = method,
                ),
                body,
            ),
        }
    }
}

fn to_wire_content(message: &ChatMessage) -> Value {
    match message.role {
        MessageRole::Assistant => {
            let mut parts = Vec::new();
            if !message.content.is_empty() {
                parts.push(json!({ "text": message.content }));
            }
            parts.extend(message.calls().iter().map(|call| {
                json!({ "functionCall": { "name": call.name, "args": call.arguments } })
            }));
            json!({ "role": "model", "parts": parts })
        }
        MessageRole::Tool | MessageRole::Function => {
            let response = match serde_json::from_str::<Value>(&message.content) {
                Ok(Value::Object(obj)) => Value::Object(obj),
                Ok(other) => json!({ "result": other }),
                Err(_) => json!({ "result": message.content }),
            };
            json!({
                "role": "user",
                "parts": [{
                    "functionResponse": {
                        "name": message.name.as_deref().unwrap_or_default(),
                        "response": response,
                    }
                }]
            })
        }
        MessageRole::User | MessageRole::System => {
            json!({ "role": "user", "parts": [{ "text": message.content }] })
        }
    }
}

/// Gemini parameters: local `$ref`s inlined, unsupported keywords removed
fn function_parameters(schema: Value) -> Value {
    let defs: Map<String, Value> = ["$defs", "definitions"]
        .iter()
        .filter_map(|key| schema.get(*key).and_then(Value::as_object))
        .flat_map(|defs| defs.iter().map(|(k, v)| (k.clone(), v.clone())))
        .collect();
    clean_schema(schema, &defs, &mut Vec::new())
}

fn local_ref(obj: &Map<String, Value>) -> Option<String> {
    let target = obj.get("$ref")?.as_str()?;
    target
        .strip_prefix("#/$defs/")
        .or_else(|| target.strip_prefix("#/definitions/"))
        .map(str::to_string)
}

/// Walks schema positions only; property names and `enum` values are data
fn clean_schema(schema: Value, defs: &Map<String, Value>, expanding: &mut Vec<String>) -> Value {
    let mut obj = match schema {
        Value::Object(obj) => obj,
        other => return other,
    };

    if let Some(name) = local_ref(&obj) {
        obj.remove("$ref");
        // A recursive type cannot be inlined; it degrades to a plain object
        let target = match defs.get(&name) {
            Some(Value::Object(target)) if !expanding.contains(&name) => target.clone(),
            _ => {
                let mut fallback = Map::new();
                fallback.insert("type".to_string(), json!("object"));
                fallback
            }
        };
        let mut merged = target;
        merged.extend(obj);
        expanding.push(name);
        let cleaned = clean_schema(Value::Object(merged), defs, expanding);
        expanding.pop();
        return cleaned;
    }

    let mut cleaned = Map::new();
    for (key, value) in obj {
        if UNSUPPORTED_SCHEMA_KEYS.contains(&key.as_str()) {
            continue;
        }
        let value = match (key.as_str(), value) {
            ("properties" | "patternProperties", Value::Object(props)) => Value::Object(
                props
                    .into_iter()
                    .map(|(name, prop)| (name, clean_schema(prop, defs, expanding)))
                    .collect(),
            ),
            ("items" | "additionalItems" | "contains" | "not", item) => {
                clean_schema(item, defs, expanding)
            }
            ("anyOf" | "oneOf" | "allOf" | "prefixItems", Value::Array(items)) => Value::Array(
                items
                    .into_iter()
                    .map(|item| clean_schema(item, defs, expanding))
                    .collect(),
            ),
            (_, other) => other,
        };
        cleaned.insert(key, value);
    }
    Value::Object(cleaned)
}
