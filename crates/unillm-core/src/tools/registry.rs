//! Tool registry and executor
//!
//! The registry holds named tools and runs them on the model's behalf:
//! - Validates input against each tool's JSON Schema
//! - Runs the tool on its own task, raced against a timeout
//! - Classifies failures into the shared error taxonomy
//! - Executes batches sequentially or concurrently, preserving call order

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;

use super::result::{ToolCallStatus, ToolResult};
use super::tool::{is_valid_tool_name, Tool};
use crate::error::{LlmError, Result};
use crate::logging::Logger;
use crate::schema;
use crate::{log_info, log_warn};
use crate::types::{CancellationToken, FunctionDefinition, ToolCall};

/// Registry limits and defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolRegistryConfig {
    /// Largest batch `execute_tools` accepts
    pub max_tool_calls: usize,
    /// Timeout applied when a call does not set its own
    pub default_timeout_ms: u64,
    /// Run batches concurrently
    pub allow_parallel: bool,
}

impl Default for ToolRegistryConfig {
    fn default() -> Self {
        Self {
            max_tool_calls: 10,
            default_timeout_ms: 30_000,
            allow_parallel: false,
        }
    }
}

/// Per-call execution options
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Overrides `ToolRegistryConfig::default_timeout_ms`
    pub timeout_ms: Option<u64>,
    /// Return failures as `Err` instead of inside the `ToolResult`
    pub throw_on_error: bool,
    /// Parent token; each call receives a child of it
    pub cancel: Option<CancellationToken>,
}

impl ExecuteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn throw_on_error(mut self) -> Self {
        self.throw_on_error = true;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Registry of callable tools
///
/// Registration takes the write lock; a batch resolves all of its tools under
/// a single read lock before anything runs, so concurrent registration never
/// changes an in-flight batch.
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<Tool>>>,
    config: ToolRegistryConfig,
    logger: Arc<dyn Logger>,
}

impl ToolRegistry {
    /// Create a registry with default limits
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self::with_config(ToolRegistryConfig::default(), logger)
    }

    pub fn with_config(config: ToolRegistryConfig, logger: Arc<dyn Logger>) -> Self {
        Self {
            tools: RwLock::new(HashMap::new()),
            config,
            logger,
        }
    }

    pub fn config(&self) -> &ToolRegistryConfig {
        &self.config
    }

    /// Add a tool
    ///
    /// Fails when the name is taken, the name is not a valid identifier, or
    /// the parameter schema does not compile.
    pub fn register(&self, tool: Tool) -> Result<()> {
        if !is_valid_tool_name(&tool.name) {
            return Err(LlmError::tool_validation(
                &tool.name,
                "name must be 1-64 characters of [A-Za-z0-9_-]",
            ));
        }
        schema::check_schema(&tool.parameters)
            .map_err(|msg| LlmError::tool_validation(&tool.name, msg))?;

        let mut tools = self.tools.write();
        if tools.contains_key(&tool.name) {
            return Err(LlmError::tool_validation(
                &tool.name,
                format!("tool '{}' is already registered", tool.name),
            ));
        }
        self.logger
            .debug(&format!("[ToolRegistry] Registered tool: {}", tool.name));
        tools.insert(tool.name.clone(), Arc::new(tool));
        Ok(())
    }

    /// Remove a tool by name
    pub fn unregister(&self, name: &str) -> Result<()> {
        match self.tools.write().remove(name) {
            Some(_) => {
                self.logger
                    .debug(&format!("[ToolRegistry] Unregistered tool: {}", name));
                Ok(())
            }
            None => Err(not_registered(name)),
        }
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.read().contains_key(name)
    }

    pub fn tool_count(&self) -> usize {
        self.tools.read().len()
    }

    /// Registered names, sorted
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Definitions for every tool, sorted by name
    pub fn function_definitions(&self) -> Vec<FunctionDefinition> {
        let mut defs: Vec<FunctionDefinition> =
            self.tools.read().values().map(|t| t.definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    fn lookup(&self, name: &str) -> Result<Arc<Tool>> {
        self.tools
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| not_registered(name))
    }

    /// Run one tool directly
    ///
    /// An unknown name is always an error. Other failures are reported in the
    /// result unless `throw_on_error` is set.
    pub async fn execute_tool(
        &self,
        name: &str,
        input: Value,
        options: ExecuteOptions,
    ) -> Result<ToolResult> {
        let tool = self.lookup(name)?;
        self.run(tool, String::new(), input, &options).await
    }

    /// Run a batch of model tool calls
    ///
    /// Fails before running anything when the batch exceeds `max_tool_calls`
    /// or names an unknown tool. Results are in call order.
    pub async fn execute_tools(
        &self,
        calls: &[ToolCall],
        options: ExecuteOptions,
    ) -> Result<Vec<ToolResult>> {
        if calls.len() > self.config.max_tool_calls {
            return Err(LlmError::tool_execution(
                calls
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(","),
                self.over_limit(calls.len()),
            ));
        }

        let resolved = {
            let tools = self.tools.read();
            calls
                .iter()
                .map(|call| {
                    tools
                        .get(&call.name)
                        .cloned()
                        .map(|tool| (tool, call))
                        .ok_or_else(|| not_registered(&call.name))
                })
                .collect::<Result<Vec<_>>>()?
        };

        log_info!(
            self.logger,
            "[ToolRegistry] Executing {} tool call(s){}",
            resolved.len(),
            if self.config.allow_parallel { " in parallel" } else { "" }
        );

        if self.config.allow_parallel {
            join_all(resolved.into_iter().map(|(tool, call)| {
                self.run(tool, call.id.clone(), call.arguments.clone(), &options)
            }))
            .await
            .into_iter()
            .collect()
        } else {
            let mut results = Vec::with_capacity(resolved.len());
            for (tool, call) in resolved {
                results.push(
                    self.run(tool, call.id.clone(), call.arguments.clone(), &options)
                        .await?,
                );
            }
            Ok(results)
        }
    }

    /// Run a batch of model tool calls without failing the batch
    ///
    /// Used by the generation loop, which must answer every call. An unknown
    /// name becomes an `ExecutionFailed` result for that call while the rest
    /// run; an oversized batch fails every call without running any.
    /// `throw_on_error` is ignored. Results are in call order.
    pub async fn execute_tool_calls(
        &self,
        calls: &[ToolCall],
        options: ExecuteOptions,
    ) -> Vec<ToolResult> {
        let options = ExecuteOptions {
            throw_on_error: false,
            ..options
        };

        if calls.len() > self.config.max_tool_calls {
            let message = self.over_limit(calls.len());
            log_warn!(self.logger, "[ToolRegistry] {}", message);
            return calls
                .iter()
                .map(|call| {
                    let err = LlmError::tool_execution(&call.name, &message);
                    ToolResult::failed(&call.name, &call.id, err)
                })
                .collect();
        }

        let resolved: Vec<(&ToolCall, Option<Arc<Tool>>)> = {
            let tools = self.tools.read();
            calls.iter().map(|call| (call, tools.get(&call.name).cloned())).collect()
        };

        if self.config.allow_parallel {
            join_all(
                resolved
                    .into_iter()
                    .map(|(call, tool)| self.settle(call, tool, &options)),
            )
            .await
        } else {
            let mut results = Vec::with_capacity(resolved.len());
            for (call, tool) in resolved {
                results.push(self.settle(call, tool, &options).await);
            }
            results
        }
    }

    async fn settle(
        &self,
        call: &ToolCall,
        tool: Option<Arc<Tool>>,
        options: &ExecuteOptions,
    ) -> ToolResult {
        let Some(tool) = tool else {
            log_warn!(self.logger, "[ToolRegistry] Model called unknown tool: {}", call.name);
            return ToolResult::failed(&call.name, &call.id, not_registered(&call.name));
        };
        match self.run(tool, call.id.clone(), call.arguments.clone(), options).await {
            Ok(result) => result,
            Err(err) => ToolResult::failed(&call.name, &call.id, err),
        }
    }

    fn over_limit(&self, count: usize) -> String {
        format!(
            "{} tool calls exceed the limit of {}",
            count, self.config.max_tool_calls
        )
    }

    async fn run(
        &self,
        tool: Arc<Tool>,
        call_id: String,
        input: Value,
        options: &ExecuteOptions,
    ) -> Result<ToolResult> {
        let started = Instant::now();
        let timeout_ms = options.timeout_ms.unwrap_or(self.config.default_timeout_ms);
        let mut result = ToolResult::pending(&tool.name, call_id);

        result.advance(ToolCallStatus::Validating);
        if let Err(msg) = schema::validate(&tool.parameters, &input) {
            log_warn!(self.logger, "[ToolRegistry] Invalid input for {}: {}", tool.name, msg);
            let err = LlmError::tool_validation(&tool.name, msg);
            return finish(result, Err((ToolCallStatus::ValidationFailed, err)), started, options);
        }

        result.advance(ToolCallStatus::Executing);
        let cancel = options
            .cancel
            .as_ref()
            .map(CancellationToken::child_token)
            .unwrap_or_default();
        let handler = Arc::clone(&tool.handler);
        let token = cancel.clone();
        let task = tokio::spawn(async move { handler.call(input, token).await });

        let outcome = match tokio::time::timeout(Duration::from_millis(timeout_ms), task).await {
            Ok(Ok(Ok(output))) => Ok(output),
            Ok(Ok(Err(e))) => Err((
                ToolCallStatus::ExecutionFailed,
                LlmError::ToolExecution {
                    tool: tool.name.clone(),
                    message: e.to_string(),
                    source: Some(e),
                },
            )),
            Ok(Err(join_err)) => Err((
                ToolCallStatus::ExecutionFailed,
                LlmError::ToolExecution {
                    tool: tool.name.clone(),
                    message: if join_err.is_panic() {
                        "tool panicked".to_string()
                    } else {
                        "tool task was cancelled".to_string()
                    },
                    source: Some(Box::new(join_err)),
                },
            )),
            Err(_) => {
                // Dropping the join handle detaches the task; only the token can stop it
                cancel.cancel();
                Err((
                    ToolCallStatus::TimedOut,
                    LlmError::ToolTimeout {
                        tool: tool.name.clone(),
                        timeout_ms,
                    },
                ))
            }
        };

        match &outcome {
            Ok(_) => self.logger.debug(&format!(
                "[ToolRegistry] {} succeeded in {}ms",
                tool.name,
                started.elapsed().as_millis()
            )),
            Err((_, err)) => log_warn!(self.logger, "[ToolRegistry] {}", err),
        }
        finish(result, outcome, started, options)
    }
}

fn not_registered(name: &str) -> LlmError {
    LlmError::tool_execution(name, format!("tool '{}' is not registered", name))
}

fn finish(
    mut result: ToolResult,
    outcome: std::result::Result<Value, (ToolCallStatus, LlmError)>,
    started: Instant,
    options: &ExecuteOptions,
) -> Result<ToolResult> {
    result.execution_time_ms = started.elapsed().as_millis() as u64;
    match outcome {
        Ok(output) => {
            result.output = Some(output);
            result.advance(ToolCallStatus::Succeeded);
            Ok(result)
        }
        Err((_, err)) if options.throw_on_error => Err(err),
        Err((status, err)) => {
            result.error = Some(err);
            result.advance(status);
            Ok(result)
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tool_names())
            .field("config", &self.config)
            .finish()
    }
}
