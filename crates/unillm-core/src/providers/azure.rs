//! Azure OpenAI
//!
//! Same wire format as OpenAI, addressed by deployment:
//! `{endpoint}/openai/deployments/{deployment}/chat/completions?api-version=...`

use serde_json::{json, Value};

use super::adapter::{trim_base, ChatOutput, ChatRequest, EmbeddingsOutput, VendorAdapter};
use super::client::VendorRequest;
use super::engine::VendorProvider;
use super::openai::{chat_body, parse_chat_body, parse_embeddings_body};
use crate::config::{NormalizedConfig, ProviderConfig, ProviderKind, DEFAULT_AZURE_API_VERSION};
use crate::error::{LlmError, Result};
use crate::types::{ProviderCapabilities, ProviderMetadata};

/// Azure OpenAI provider
pub type AzureProvider = VendorProvider<AzureAdapter>;

#[derive(Debug, Clone)]
pub struct AzureAdapter {
    api_key: String,
    endpoint: String,
    deployment: String,
    embedding_deployment: Option<String>,
    api_version: String,
}

impl VendorAdapter for AzureAdapter {
    fn from_config(config: &NormalizedConfig) -> Result<Self> {
        let ProviderConfig::Azure(azure) = config.config() else {
            return Err(LlmError::configuration(format!(
                "expected an azure config, got {}",
                config.kind()
            )));
        };
        let missing = |field: &str| LlmError::configuration(format!("azure requires {}", field));

        Ok(Self {
            api_key: config.api_key().ok_or_else(|| missing("an API key"))?.to_string(),
            endpoint: trim_base(
                config
                    .base_url()
                    .or(azure.endpoint.as_deref())
                    .ok_or_else(|| missing("an endpoint"))?,
            ),
            deployment: azure
                .deployment_name
                .clone()
                .ok_or_else(|| missing("a deployment name"))?,
            embedding_deployment: azure.embedding_deployment.clone(),
            api_version: azure
                .api_version
                .clone()
                .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string()),
        })
    }

    fn metadata(&self) -> ProviderMetadata {
        let defaults = ProviderKind::Azure.default_settings();
        ProviderMetadata {
            id: ProviderKind::Azure.as_str().to_string(),
            display_name: "Azure OpenAI".to_string(),
            default_api_base: self.endpoint.clone(),
            default_model: defaults.model.unwrap_or_default(),
            default_embedding_model: defaults.embedding_model,
            capabilities: ProviderCapabilities::full(),
        }
    }

    fn chat_request(&self, request: &ChatRequest<'_>) -> Result<VendorRequest> {
        Ok(self.request(&self.deployment, "chat/completions", chat_body(request)))
    }

    fn parse_chat(&self, body: &Value) -> Result<ChatOutput> {
        parse_chat_body("azure", body)
    }

    /// Uses the embedding deployment, or a deployment named after the model
    fn embeddings_request(&self, inputs: &[String], model: &str) -> Result<VendorRequest> {
        let deployment = self.embedding_deployment.as_deref().unwrap_or(model);
        Ok(self.request(deployment, "embeddings", json!({ "input": inputs })))
    }

    fn parse_embeddings(&self, body: &Value) -> Result<EmbeddingsOutput> {
        parse_embeddings_body("azure", body)
    }
}

impl AzureAdapter {
    fn request(&self, deployment: &str, operation: &str, body: Value) -> VendorRequest {
        let url = format!(
            "{}/openai/deployments/{}/{}?api-version={}",
            self.endpoint, deployment, operation, self.api_version
        );
        VendorRequest::new(url, body).with_header("api-key", &self.api_key)
    }
}
