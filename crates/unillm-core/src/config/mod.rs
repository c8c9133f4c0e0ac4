//! Provider configuration
//!
//! - `ProviderConfig`: tagged union of the vendor-specific settings
//! - `ConfigValidator`: defaults, range checks and credential lookup
//! - `FileConfigProvider`: named configurations stored in YAML

mod provider;
mod validator;
mod file;

pub use provider::{
    apply_defaults, AnthropicConfig, AzureConfig, CommonSettings, ExecutionMode, GoogleConfig,
    NormalizedConfig, OpenAiConfig, ProviderConfig, ProviderKind, DEFAULT_AZURE_API_VERSION,
    DEFAULT_GOOGLE_LOCATION, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
};
pub use validator::{validate, ConfigValidator};
pub(crate) use validator::check_ranges;
pub use file::{ConfigFile, ConfigFileError, ConfigFileResult, ConfigLevel, FileConfigProvider};
