//! Provider metadata types

use serde::{Deserialize, Serialize};

/// What a provider can do
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    /// Whether the provider supports tool/function calling
    #[serde(default)]
    pub tool_calling: bool,
    /// Whether structured generation is available
    #[serde(default)]
    pub structured_output: bool,
    /// Whether the provider offers an embeddings endpoint
    #[serde(default)]
    pub embeddings: bool,
}

impl ProviderCapabilities {
    /// Create capabilities with all features enabled
    pub fn full() -> Self {
        Self {
            tool_calling: true,
            structured_output: true,
            embeddings: true,
        }
    }

    /// Everything except embeddings
    pub fn without_embeddings() -> Self {
        Self {
            embeddings: false,
            ..Self::full()
        }
    }
}

/// Provider metadata (static information about a provider)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMetadata {
    /// Provider identifier
    pub id: String,
    /// Display name
    pub display_name: String,
    /// Default API base URL
    pub default_api_base: String,
    /// Default chat model
    pub default_model: String,
    /// Default embedding model, if the vendor has embeddings
    pub default_embedding_model: Option<String>,
    pub capabilities: ProviderCapabilities,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities() {
        assert!(ProviderCapabilities::full().embeddings);
        let caps = ProviderCapabilities::without_embeddings();
        assert!(!caps.embeddings);
        assert!(caps.tool_calling);
        assert!(caps.structured_output);
    }
}
