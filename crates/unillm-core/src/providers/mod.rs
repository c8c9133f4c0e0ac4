//! LLM providers
//!
//! ## Architecture
//!
//! Every vendor is a [`VendorProvider`] parameterised by a [`VendorAdapter`]:
//! - the provider owns option merging, mock mode, tool round trips,
//!   structured output validation and embeddings batching
//! - the adapter translates requests and responses for one wire format
//! - the [`VendorClient`] performs the HTTP exchange (reqwest by default,
//!   injectable for tests or custom auth)

mod adapter;
mod anthropic;
mod azure;
mod client;
mod engine;
mod google;
mod mock;
mod openai;
mod traits;

pub use adapter::{ChatOutput, ChatRequest, EmbeddingsOutput, VendorAdapter};
pub use anthropic::{AnthropicAdapter, AnthropicProvider, ANTHROPIC_API_BASE, ANTHROPIC_VERSION};
pub use azure::{AzureAdapter, AzureProvider};
pub use client::{HttpVendorClient, VendorClient, VendorError, VendorRequest, DEFAULT_REQUEST_TIMEOUT};
pub use engine::VendorProvider;
pub use google::{GoogleAdapter, GoogleProvider, GEMINI_API_BASE};
pub use mock::{mock_embedding, mock_text, mock_value, MOCK_EMBEDDING_DIMENSIONS};
pub use openai::{OpenAiAdapter, OpenAiProvider, OPENAI_API_BASE};
pub use traits::{
    EmbeddingInput, EmbeddingOptions, GenerateOptions, Provider, ProviderExt, StructuredOptions,
    DEFAULT_STRUCTURED_FUNCTION,
};

use std::sync::Arc;

use crate::config::{self, NormalizedConfig, ProviderConfig, ProviderKind};
use crate::error::Result;
use crate::logging::Logger;

/// Create a provider from a raw configuration
///
/// The config is validated (defaults, ranges, credentials from the
/// environment) and the provider talks HTTP through [`HttpVendorClient`].
pub fn create_provider(config: ProviderConfig, logger: Arc<dyn Logger>) -> Result<Box<dyn Provider>> {
    let normalized = config::validate(config)?;
    create_provider_with_client(normalized, Arc::new(HttpVendorClient::new()?), logger)
}

/// Create a provider over an already validated config and a custom client
pub fn create_provider_with_client(
    config: NormalizedConfig,
    client: Arc<dyn VendorClient>,
    logger: Arc<dyn Logger>,
) -> Result<Box<dyn Provider>> {
    Ok(match config.kind() {
        ProviderKind::OpenAi => Box::new(OpenAiProvider::new(config, client, logger)?),
        ProviderKind::Azure => Box::new(AzureProvider::new(config, client, logger)?),
        ProviderKind::Anthropic => Box::new(AnthropicProvider::new(config, client, logger)?),
        ProviderKind::Google => Box::new(GoogleProvider::new(config, client, logger)?),
    })
}

/// List all supported provider IDs
pub fn supported_providers() -> Vec<&'static str> {
    ProviderKind::ALL.iter().map(|kind| kind.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigValidator;
    use crate::error::ErrorKind;
    use crate::logging::NoOpLogger;
    use crate::secrets::MemorySecretStore;
    use crate::types::ChatMessage;
    use engine::testing::ScriptedClient;

    fn validator() -> ConfigValidator {
        ConfigValidator::with_secret_store(Arc::new(MemorySecretStore::new()))
    }

    #[test]
    fn test_supported_providers() {
        assert_eq!(supported_providers(), vec!["openai", "azure", "anthropic", "google"]);
    }

    #[test]
    fn test_factory_dispatches_on_kind() {
        let configs = [
            ProviderConfig::openai("k"),
            ProviderConfig::azure("k", "https://res.openai.azure.com", "dep"),
            ProviderConfig::anthropic("k"),
            ProviderConfig::google("k"),
        ];
        for config in configs {
            let kind = config.kind();
            let provider = create_provider_with_client(
                validator().validate(config).unwrap(),
                Arc::new(ScriptedClient::default()),
                Arc::new(NoOpLogger),
            )
            .unwrap();
            assert_eq!(provider.name(), kind.as_str());
            assert_eq!(provider.config().kind(), kind);
        }
    }

    #[test]
    fn test_factory_rejects_invalid_config() {
        let err = create_provider(
            ProviderConfig::openai("k").with_temperature(3.0),
            Arc::new(NoOpLogger),
        )
        .err()
        .unwrap();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_mock_provider_from_factory() {
        let provider = create_provider(ProviderConfig::google("k").mock(), Arc::new(NoOpLogger)).unwrap();
        let response = provider
            .generate_text(vec![ChatMessage::user("ping")], GenerateOptions::new())
            .await
            .unwrap();
        assert_eq!(response.content, "Mock response: ping");
        assert_eq!(provider.metadata().id, "google");
    }
}
