//! Provider configuration types

use serde::{Deserialize, Serialize};

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Default maximum output tokens
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
/// Accepted range for `max_tokens`
pub const MAX_TOKENS_RANGE: std::ops::RangeInclusive<u32> = 1..=100_000;
/// Accepted range for `temperature`
pub const TEMPERATURE_RANGE: std::ops::RangeInclusive<f32> = 0.0..=1.0;
/// Default Azure OpenAI API version
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-10-21";
/// Default Vertex AI location for service-account credentials
pub const DEFAULT_GOOGLE_LOCATION: &str = "us-central1";

/// Whether provider operations call the vendor or return mock values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Call the vendor
    #[default]
    Live,
    /// Return deterministic mock values without touching the network
    Mock,
}

/// Supported vendor families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAi,
    Azure,
    Anthropic,
    Google,
}

impl ProviderKind {
    /// All supported kinds
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::OpenAi,
        ProviderKind::Azure,
        ProviderKind::Anthropic,
        ProviderKind::Google,
    ];

    /// Tag used in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Azure => "azure",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Google => "google",
        }
    }

    /// Parse a configuration tag
    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(tag.trim()))
    }

    /// Vendor defaults for model names
    pub fn default_settings(&self) -> CommonSettings {
        let (model, embedding_model) = match self {
            ProviderKind::OpenAi => ("gpt-4o-mini", Some("text-embedding-3-small")),
            ProviderKind::Azure => ("gpt-4o", Some("text-embedding-3-small")),
            ProviderKind::Anthropic => ("claude-3-5-sonnet-latest", None),
            ProviderKind::Google => ("gemini-1.5-flash", Some("text-embedding-004")),
        };
        CommonSettings {
            model: Some(model.to_string()),
            embedding_model: embedding_model.map(str::to_string),
            temperature: Some(DEFAULT_TEMPERATURE),
            max_tokens: Some(DEFAULT_MAX_TOKENS),
            stream: Some(false),
            ..Default::default()
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings shared by every vendor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommonSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    /// Sampling temperature, 0.0 - 1.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum output tokens, 1 - 100000
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// Overrides the vendor's default API base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default)]
    pub execution_mode: ExecutionMode,
}

/// Layer `overrides` on top of `base`
///
/// Every field set in `overrides` wins; unset fields fall back to `base`.
/// `execution_mode` always comes from `overrides`.
pub fn apply_defaults(base: &CommonSettings, overrides: &CommonSettings) -> CommonSettings {
    CommonSettings {
        api_key: overrides.api_key.clone().or_else(|| base.api_key.clone()),
        model: overrides.model.clone().or_else(|| base.model.clone()),
        embedding_model: overrides
            .embedding_model
            .clone()
            .or_else(|| base.embedding_model.clone()),
        temperature: overrides.temperature.or(base.temperature),
        max_tokens: overrides.max_tokens.or(base.max_tokens),
        stream: overrides.stream.or(base.stream),
        base_url: overrides.base_url.clone().or_else(|| base.base_url.clone()),
        execution_mode: overrides.execution_mode,
    }
}

/// OpenAI settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(flatten)]
    pub common: CommonSettings,
    /// Sent as `OpenAI-Organization`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

/// Azure OpenAI settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AzureConfig {
    #[serde(flatten)]
    pub common: CommonSettings,
    /// Resource endpoint, e.g. `https://myresource.openai.azure.com`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Chat deployment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_name: Option<String>,
    /// Embeddings deployment; the embedding model name when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_deployment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

/// Anthropic settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnthropicConfig {
    #[serde(flatten)]
    pub common: CommonSettings,
}

/// Google settings: an API key or a service-account triple
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoogleConfig {
    #[serde(flatten)]
    pub common: CommonSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    /// Vertex AI region used with service-account credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl GoogleConfig {
    /// Whether all three service-account fields are present
    pub fn has_service_account(&self) -> bool {
        [&self.project_id, &self.client_email, &self.private_key]
            .iter()
            .all(|f| f.as_deref().is_some_and(|v| !v.is_empty()))
    }
}

/// Provider configuration, discriminated by the `provider` tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ProviderConfig {
    OpenAi(OpenAiConfig),
    Azure(AzureConfig),
    Anthropic(AnthropicConfig),
    Google(GoogleConfig),
}

impl ProviderConfig {
    /// OpenAI config with an explicit key
    pub fn openai(api_key: impl Into<String>) -> Self {
        let mut config = ProviderConfig::OpenAi(OpenAiConfig::default());
        config.common_mut().api_key = Some(api_key.into());
        config
    }

    /// Azure config with explicit endpoint and deployment
    pub fn azure(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        deployment_name: impl Into<String>,
    ) -> Self {
        ProviderConfig::Azure(AzureConfig {
            common: CommonSettings {
                api_key: Some(api_key.into()),
                ..Default::default()
            },
            endpoint: Some(endpoint.into()),
            deployment_name: Some(deployment_name.into()),
            ..Default::default()
        })
    }

    /// Anthropic config with an explicit key
    pub fn anthropic(api_key: impl Into<String>) -> Self {
        let mut config = ProviderConfig::Anthropic(AnthropicConfig::default());
        config.common_mut().api_key = Some(api_key.into());
        config
    }

    /// Google config with an explicit API key
    pub fn google(api_key: impl Into<String>) -> Self {
        let mut config = ProviderConfig::Google(GoogleConfig::default());
        config.common_mut().api_key = Some(api_key.into());
        config
    }

    /// Google config using service-account credentials
    pub fn google_service_account(
        project_id: impl Into<String>,
        client_email: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Self {
        ProviderConfig::Google(GoogleConfig {
            project_id: Some(project_id.into()),
            client_email: Some(client_email.into()),
            private_key: Some(private_key.into()),
            ..Default::default()
        })
    }

    /// Config with no explicit fields, relying on defaults and env lookups
    pub fn empty(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::OpenAi => ProviderConfig::OpenAi(OpenAiConfig::default()),
            ProviderKind::Azure => ProviderConfig::Azure(AzureConfig::default()),
            ProviderKind::Anthropic => ProviderConfig::Anthropic(AnthropicConfig::default()),
            ProviderKind::Google => ProviderConfig::Google(GoogleConfig::default()),
        }
    }

    /// Vendor family
    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderConfig::OpenAi(_) => ProviderKind::OpenAi,
            ProviderConfig::Azure(_) => ProviderKind::Azure,
            ProviderConfig::Anthropic(_) => ProviderKind::Anthropic,
            ProviderConfig::Google(_) => ProviderKind::Google,
        }
    }

    /// Shared settings
    pub fn common(&self) -> &CommonSettings {
        match self {
            ProviderConfig::OpenAi(c) => &c.common,
            ProviderConfig::Azure(c) => &c.common,
            ProviderConfig::Anthropic(c) => &c.common,
            ProviderConfig::Google(c) => &c.common,
        }
    }

    /// Shared settings, mutable
    pub fn common_mut(&mut self) -> &mut CommonSettings {
        match self {
            ProviderConfig::OpenAi(c) => &mut c.common,
            ProviderConfig::Azure(c) => &mut c.common,
            ProviderConfig::Anthropic(c) => &mut c.common,
            ProviderConfig::Google(c) => &mut c.common,
        }
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.common_mut().model = Some(model.into());
        self
    }

    /// Set the embedding model
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.common_mut().embedding_model = Some(model.into());
        self
    }

    /// Set the temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.common_mut().temperature = Some(temperature);
        self
    }

    /// Set max output tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.common_mut().max_tokens = Some(max_tokens);
        self
    }

    /// Set the API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.common_mut().base_url = Some(base_url.into());
        self
    }

    /// Set the execution mode
    pub fn with_execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.common_mut().execution_mode = mode;
        self
    }

    /// Shorthand for `with_execution_mode(ExecutionMode::Mock)`
    pub fn mock(self) -> Self {
        self.with_execution_mode(ExecutionMode::Mock)
    }
}

/// A validated, fully populated configuration
///
/// Only `ConfigValidator` creates these. Accessors return the populated
/// values directly.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedConfig(ProviderConfig);

impl NormalizedConfig {
    pub(crate) fn new_unchecked(config: ProviderConfig) -> Self {
        Self(config)
    }

    /// The underlying configuration
    pub fn config(&self) -> &ProviderConfig {
        &self.0
    }

    /// Unwrap into the underlying configuration
    pub fn into_inner(self) -> ProviderConfig {
        self.0
    }

    pub fn kind(&self) -> ProviderKind {
        self.0.kind()
    }

    /// API key; absent only for Google service-account configs
    pub fn api_key(&self) -> Option<&str> {
        self.0.common().api_key.as_deref()
    }

    pub fn model(&self) -> &str {
        self.0.common().model.as_deref().unwrap_or_default()
    }

    pub fn embedding_model(&self) -> Option<&str> {
        self.0.common().embedding_model.as_deref()
    }

    pub fn temperature(&self) -> f32 {
        self.0.common().temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn max_tokens(&self) -> u32 {
        self.0.common().max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    pub fn stream(&self) -> bool {
        self.0.common().stream.unwrap_or(false)
    }

    pub fn base_url(&self) -> Option<&str> {
        self.0.common().base_url.as_deref()
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        self.0.common().execution_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_parse() {
        assert_eq!(ProviderKind::parse("OpenAI"), Some(ProviderKind::OpenAi));
        assert_eq!(ProviderKind::parse("google"), Some(ProviderKind::Google));
        assert_eq!(ProviderKind::parse("cohere"), None);
    }

    #[test]
    fn test_apply_defaults_overrides_win() {
        let base = CommonSettings {
            model: Some("base-model".into()),
            temperature: Some(0.7),
            max_tokens: Some(100),
            ..Default::default()
        };
        let overrides = CommonSettings {
            temperature: Some(0.2),
            execution_mode: ExecutionMode::Mock,
            ..Default::default()
        };
        let merged = apply_defaults(&base, &overrides);
        assert_eq!(merged.model.as_deref(), Some("base-model"));
        assert_eq!(merged.temperature, Some(0.2));
        assert_eq!(merged.max_tokens, Some(100));
        assert_eq!(merged.execution_mode, ExecutionMode::Mock);
    }

    #[test]
    fn test_tagged_deserialization() {
        let config: ProviderConfig = serde_json::from_value(json!({
            "provider": "azure",
            "api_key": "k",
            "endpoint": "https://res.openai.azure.com",
            "deployment_name": "gpt4o",
            "temperature": 0.5
        }))
        .unwrap();

        assert_eq!(config.kind(), ProviderKind::Azure);
        assert_eq!(config.common().temperature, Some(0.5));
        match config {
            ProviderConfig::Azure(azure) => {
                assert_eq!(azure.deployment_name.as_deref(), Some("gpt4o"));
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_serialization_round_trip_keeps_tag() {
        let config = ProviderConfig::anthropic("k").with_model("claude").mock();
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["provider"], "anthropic");
        assert_eq!(value["execution_mode"], "mock");
        let back: ProviderConfig = serde_json::from_value(value).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_service_account_detection() {
        let ProviderConfig::Google(google) =
            ProviderConfig::google_service_account("p", "e@x.iam.gserviceaccount.com", "key")
        else {
            panic!("expected google");
        };
        assert!(google.has_service_account());

        let partial = GoogleConfig {
            project_id: Some("p".into()),
            ..Default::default()
        };
        assert!(!partial.has_service_account());
    }
}
