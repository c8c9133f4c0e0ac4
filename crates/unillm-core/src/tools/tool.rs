//! Callable tool definitions

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::BoxError;
use crate::types::{CancellationToken, FunctionDefinition};

/// Body of a tool
///
/// Long-running tools should watch `cancel`; it fires when the call times out
/// or the caller cancels. A tool that ignores it keeps running in the
/// background after its timeout has been reported.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, input: Value, cancel: CancellationToken) -> Result<Value, BoxError>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> ToolHandler for FnHandler<F>
where
    F: Fn(Value, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, BoxError>> + Send + 'static,
{
    async fn call(&self, input: Value, cancel: CancellationToken) -> Result<Value, BoxError> {
        (self.0)(input, cancel).await
    }
}

/// A named tool the model can call
#[derive(Clone)]
pub struct Tool {
    pub name: String,
    pub description: String,
    /// JSON Schema the input must satisfy
    pub parameters: Value,
    pub handler: Arc<dyn ToolHandler>,
}

impl Tool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            handler,
        }
    }

    /// Build a tool from an async closure
    ///
    /// ```
    /// use serde_json::json;
    /// use unillm_core::tools::Tool;
    ///
    /// let add = Tool::from_fn(
    ///     "add",
    ///     "Add two numbers",
    ///     json!({
    ///         "type": "object",
    ///         "properties": { "a": { "type": "number" }, "b": { "type": "number" } },
    ///         "required": ["a", "b"]
    ///     }),
    ///     |input, _cancel| async move {
    ///         let a = input["a"].as_f64().unwrap_or_default();
    ///         let b = input["b"].as_f64().unwrap_or_default();
    ///         Ok(json!(a + b))
    ///     },
    /// );
    /// assert_eq!(add.name, "add");
    /// ```
    pub fn from_fn<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
        f: F,
    ) -> Self
    where
        F: Fn(Value, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, BoxError>> + Send + 'static,
    {
        Self::new(name, description, parameters, Arc::new(FnHandler(f)))
    }

    /// Definition sent to the model
    pub fn definition(&self) -> FunctionDefinition {
        FunctionDefinition::new(&self.name, &self.description, self.parameters.clone())
    }
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// Names may contain ASCII letters, digits, `_` and `-`
pub(crate) fn is_valid_tool_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
