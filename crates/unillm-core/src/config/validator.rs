//! Provider configuration validation and normalization

use std::sync::Arc;

use serde_json::Value;

use crate::error::{LlmError, Result};
use crate::secrets::{env_vars_for, EnvSecretStore, SecretStore};

use super::provider::{
    apply_defaults, CommonSettings, NormalizedConfig, ProviderConfig, ProviderKind,
    DEFAULT_AZURE_API_VERSION, DEFAULT_GOOGLE_LOCATION, MAX_TOKENS_RANGE, TEMPERATURE_RANGE,
};

/// Azure endpoint fallback variable
pub const AZURE_ENDPOINT_ENV: &str = "AZURE_OPENAI_ENDPOINT";
/// Azure deployment fallback variable
pub const AZURE_DEPLOYMENT_ENV: &str = "AZURE_OPENAI_DEPLOYMENT_NAME";
/// Google service-account fallback variables
pub const GOOGLE_PROJECT_ID_ENV: &str = "GOOGLE_PROJECT_ID";
pub const GOOGLE_CLIENT_EMAIL_ENV: &str = "GOOGLE_CLIENT_EMAIL";
pub const GOOGLE_PRIVATE_KEY_ENV: &str = "GOOGLE_PRIVATE_KEY";

/// Validates provider configurations and fills in defaults
///
/// Missing credentials and vendor fields are looked up in the secret store
/// (the process environment by default) before failing.
#[derive(Clone)]
pub struct ConfigValidator {
    secrets: Arc<dyn SecretStore>,
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConfigValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigValidator")
            .field("secrets", &self.secrets.name())
            .finish()
    }
}

impl ConfigValidator {
    /// Validator backed by environment variables
    pub fn new() -> Self {
        Self::with_secret_store(Arc::new(EnvSecretStore::new()))
    }

    /// Validator backed by a custom secret store
    pub fn with_secret_store(secrets: Arc<dyn SecretStore>) -> Self {
        Self { secrets }
    }

    /// Validate a raw JSON/YAML-shaped configuration
    ///
    /// Catches the cases the typed API can't express: absent config and a
    /// missing or unknown `provider` tag.
    pub fn validate_value(&self, value: &Value) -> Result<NormalizedConfig> {
        let object = match value {
            Value::Null => return Err(LlmError::configuration("Configuration is required")),
            Value::Object(map) => map,
            _ => return Err(LlmError::configuration("Configuration must be an object")),
        };

        let tag = match object.get("provider") {
            None | Some(Value::Null) => {
                return Err(LlmError::configuration("Provider type is required"))
            }
            Some(Value::String(tag)) => tag,
            Some(other) => {
                return Err(LlmError::configuration(format!(
                    "Provider type must be a string, got {}",
                    other
                )))
            }
        };

        let kind = ProviderKind::parse(tag)
            .ok_or_else(|| LlmError::configuration(format!("Unsupported provider: {}", tag)))?;

        let mut normalized = value.clone();
        normalized["provider"] = Value::String(kind.as_str().to_string());
        let config: ProviderConfig = serde_json::from_value(normalized)
            .map_err(|e| LlmError::configuration(format!("Invalid {} configuration: {}", kind, e)))?;

        self.validate(config)
    }

    /// Validate and normalize a configuration
    ///
    /// Defaults are applied first, then ranges are checked, then each vendor's
    /// required fields. Validating an already normalized config returns an
    /// equal config.
    pub fn validate(&self, config: ProviderConfig) -> Result<NormalizedConfig> {
        let mut config = config;
        let kind = config.kind();

        let merged = apply_defaults(&kind.default_settings(), config.common());
        *config.common_mut() = merged;

        check_ranges(config.common())?;

        match &mut config {
            ProviderConfig::OpenAi(c) => {
                self.require_api_key(kind, &mut c.common)?;
            }
            ProviderConfig::Anthropic(c) => {
                self.require_api_key(kind, &mut c.common)?;
            }
            ProviderConfig::Azure(c) => {
                if c.api_version.is_none() {
                    c.api_version = Some(DEFAULT_AZURE_API_VERSION.to_string());
                }
                self.require_api_key(kind, &mut c.common)?;
                c.endpoint = Some(self.require_field(
                    c.endpoint.take(),
                    &[AZURE_ENDPOINT_ENV],
                    "Azure OpenAI endpoint",
                )?);
                c.deployment_name = Some(self.require_field(
                    c.deployment_name.take(),
                    &[AZURE_DEPLOYMENT_ENV],
                    "Azure OpenAI deployment name",
                )?);
            }
            ProviderConfig::Google(c) => {
                if c.location.is_none() {
                    c.location = Some(DEFAULT_GOOGLE_LOCATION.to_string());
                }
                let api_key = present(c.common.api_key.take())
                    .or_else(|| self.secrets.get_first(env_vars_for(kind.as_str())));

                if api_key.is_some() {
                    c.common.api_key = api_key;
                } else {
                    c.project_id = present(c.project_id.take())
                        .or_else(|| self.secrets.get(GOOGLE_PROJECT_ID_ENV));
                    c.client_email = present(c.client_email.take())
                        .or_else(|| self.secrets.get(GOOGLE_CLIENT_EMAIL_ENV));
                    c.private_key = present(c.private_key.take())
                        .or_else(|| self.secrets.get(GOOGLE_PRIVATE_KEY_ENV));

                    if !c.has_service_account() {
                        return Err(LlmError::configuration(
                            "Google requires either an API key or service account credentials \
                             (project_id, client_email, private_key)",
                        ));
                    }
                }
            }
        }

        Ok(NormalizedConfig::new_unchecked(config))
    }

    fn require_api_key(&self, kind: ProviderKind, common: &mut CommonSettings) -> Result<()> {
        let env_vars = env_vars_for(kind.as_str());
        let what = format!("{} API key", kind);
        common.api_key = Some(self.require_field(common.api_key.take(), env_vars, &what)?);
        Ok(())
    }

    fn require_field(&self, explicit: Option<String>, env_vars: &[&str], what: &str) -> Result<String> {
        present(explicit)
            .or_else(|| self.secrets.get_first(env_vars))
            .ok_or_else(|| {
                if env_vars.is_empty() {
                    LlmError::configuration(format!("{} is required", what))
                } else {
                    LlmError::configuration(format!(
                        "{} is required (set it in the config or via {})",
                        what,
                        env_vars.join(" / ")
                    ))
                }
            })
    }
}

/// Treat empty strings as absent
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Range checks shared by config validation and per-call option merging
pub(crate) fn check_ranges(settings: &CommonSettings) -> Result<()> {
    if let Some(temperature) = settings.temperature {
        if !TEMPERATURE_RANGE.contains(&temperature) {
            return Err(LlmError::configuration(format!(
                "Temperature must be between {} and {}, got {}",
                TEMPERATURE_RANGE.start(),
                TEMPERATURE_RANGE.end(),
                temperature
            )));
        }
    }
    if let Some(max_tokens) = settings.max_tokens {
        if !MAX_TOKENS_RANGE.contains(&max_tokens) {
            return Err(LlmError::configuration(format!(
                "Max tokens must be between {} and {}, got {}",
                MAX_TOKENS_RANGE.start(),
                MAX_TOKENS_RANGE.end(),
                max_tokens
            )));
        }
    }
    Ok(())
}

/// Validate against the process environment
pub fn validate(config: ProviderConfig) -> Result<NormalizedConfig> {
    ConfigValidator::new().validate(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::provider::{ExecutionMode, GoogleConfig, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
    use crate::error::ErrorKind;
    use crate::secrets::MemorySecretStore;
    use serde_json::json;

    fn validator_with(secrets: &[(&str, &str)]) -> ConfigValidator {
        ConfigValidator::with_secret_store(Arc::new(MemorySecretStore::with_secrets(
            secrets.iter().copied(),
        )))
    }

    fn empty_validator() -> ConfigValidator {
        validator_with(&[])
    }

    fn config_error_message(result: Result<NormalizedConfig>) -> String {
        let err = result.expect_err("expected a configuration error");
        assert_eq!(err.kind(), ErrorKind::Configuration, "{}", err);
        err.to_string()
    }

    #[test]
    fn test_defaults_applied() {
        let normalized = empty_validator()
            .validate(ProviderConfig::openai("sk-test"))
            .unwrap();

        assert_eq!(normalized.model(), "gpt-4o-mini");
        assert_eq!(normalized.embedding_model(), Some("text-embedding-3-small"));
        assert_eq!(normalized.temperature(), DEFAULT_TEMPERATURE);
        assert_eq!(normalized.max_tokens(), DEFAULT_MAX_TOKENS);
        assert!(!normalized.stream());
        assert_eq!(normalized.execution_mode(), ExecutionMode::Live);
        assert_eq!(normalized.config().common().stream, Some(false));
    }

    #[test]
    fn test_explicit_values_win() {
        let normalized = empty_validator()
            .validate(
                ProviderConfig::anthropic("key")
                    .with_model("claude-3-haiku")
                    .with_temperature(0.1)
                    .with_max_tokens(256),
            )
            .unwrap();

        assert_eq!(normalized.model(), "claude-3-haiku");
        assert_eq!(normalized.temperature(), 0.1);
        assert_eq!(normalized.max_tokens(), 256);
        assert_eq!(normalized.embedding_model(), None);
    }

    #[test]
    fn test_validate_is_idempotent() {
        let validator = validator_with(&[
            ("AZURE_OPENAI_API_KEY", "az-key"),
            ("AZURE_OPENAI_ENDPOINT", "https://res.openai.azure.com"),
            ("AZURE_OPENAI_DEPLOYMENT_NAME", "chat"),
        ]);
        let configs = vec![
            ProviderConfig::openai("sk").with_temperature(0.0),
            ProviderConfig::empty(ProviderKind::Azure),
            ProviderConfig::anthropic("k").with_max_tokens(100_000),
            ProviderConfig::google_service_account("p", "e", "pk"),
        ];

        for config in configs {
            let first = validator.validate(config).unwrap();
            let second = validator.validate(first.config().clone()).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_temperature_out_of_range() {
        let message = config_error_message(
            empty_validator().validate(ProviderConfig::openai("sk").with_temperature(1.5)),
        );
        assert!(message.contains("Temperature"), "{}", message);

        assert!(empty_validator()
            .validate(ProviderConfig::openai("sk").with_temperature(-0.1))
            .is_err());
        assert!(empty_validator()
            .validate(ProviderConfig::openai("sk").with_temperature(f32::NAN))
            .is_err());
    }

    #[test]
    fn test_max_tokens_out_of_range() {
        let message = config_error_message(
            empty_validator().validate(ProviderConfig::openai("sk").with_max_tokens(0)),
        );
        assert!(message.contains("Max tokens"), "{}", message);

        assert!(empty_validator()
            .validate(ProviderConfig::openai("sk").with_max_tokens(100_001))
            .is_err());
    }

    #[test]
    fn test_api_key_from_secret_store() {
        let validator = validator_with(&[("ANTHROPIC_API_KEY", "from-env")]);
        let normalized = validator
            .validate(ProviderConfig::empty(ProviderKind::Anthropic))
            .unwrap();
        assert_eq!(normalized.api_key(), Some("from-env"));
    }

    #[test]
    fn test_missing_api_key() {
        let message =
            config_error_message(empty_validator().validate(ProviderConfig::empty(ProviderKind::OpenAi)));
        assert!(message.contains("OPENAI_API_KEY"), "{}", message);
    }

    #[test]
    fn test_empty_api_key_counts_as_missing() {
        assert!(empty_validator().validate(ProviderConfig::openai("  ")).is_err());
    }

    #[test]
    fn test_azure_requires_endpoint_and_deployment() {
        let validator = validator_with(&[("AZURE_OPENAI_API_KEY", "k")]);
        let message = config_error_message(validator.validate(ProviderConfig::empty(ProviderKind::Azure)));
        assert!(message.contains("endpoint"), "{}", message);

        let validator = validator_with(&[
            ("AZURE_OPENAI_API_KEY", "k"),
            ("AZURE_OPENAI_ENDPOINT", "https://res.openai.azure.com"),
        ]);
        let message = config_error_message(validator.validate(ProviderConfig::empty(ProviderKind::Azure)));
        assert!(message.contains("deployment"), "{}", message);
    }

    #[test]
    fn test_azure_defaults_api_version() {
        let normalized = empty_validator()
            .validate(ProviderConfig::azure("k", "https://res.openai.azure.com", "chat"))
            .unwrap();
        match normalized.config() {
            ProviderConfig::Azure(azure) => {
                assert_eq!(azure.api_version.as_deref(), Some(DEFAULT_AZURE_API_VERSION));
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_google_api_key_or_service_account() {
        assert!(empty_validator().validate(ProviderConfig::google("g-key")).is_ok());
        assert!(empty_validator()
            .validate(ProviderConfig::google_service_account("p", "e", "pk"))
            .is_ok());

        let partial = ProviderConfig::Google(GoogleConfig {
            project_id: Some("p".into()),
            client_email: Some("e".into()),
            ..Default::default()
        });
        let message = config_error_message(empty_validator().validate(partial.clone()));
        assert!(message.contains("service account"), "{}", message);

        // The missing third field can come from the environment
        let validator = validator_with(&[("GOOGLE_PRIVATE_KEY", "pk")]);
        let normalized = validator.validate(partial).unwrap();
        match normalized.config() {
            ProviderConfig::Google(google) => {
                assert!(google.has_service_account());
                assert_eq!(google.location.as_deref(), Some(DEFAULT_GOOGLE_LOCATION));
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_validate_value_absent_config() {
        let message = config_error_message(empty_validator().validate_value(&Value::Null));
        assert!(message.contains("required"), "{}", message);
    }

    #[test]
    fn test_validate_value_missing_provider() {
        let message = config_error_message(empty_validator().validate_value(&json!({ "api_key": "k" })));
        assert!(message.contains("Provider type is required"), "{}", message);
    }

    #[test]
    fn test_validate_value_unknown_provider() {
        let message = config_error_message(
            empty_validator().validate_value(&json!({ "provider": "cohere", "api_key": "k" })),
        );
        assert!(message.contains("Unsupported provider"), "{}", message);
    }

    #[test]
    fn test_validate_value_ok() {
        let normalized = empty_validator()
            .validate_value(&json!({
                "provider": "OpenAI",
                "api_key": "sk",
                "execution_mode": "mock"
            }))
            .unwrap();
        assert_eq!(normalized.kind(), ProviderKind::OpenAi);
        assert_eq!(normalized.execution_mode(), ExecutionMode::Mock);
    }
}
