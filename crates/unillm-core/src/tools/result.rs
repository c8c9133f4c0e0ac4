//! Outcome of one tool call

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::LlmError;

/// Lifecycle of a tool call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    Pending,
    Validating,
    Executing,
    Succeeded,
    ValidationFailed,
    ExecutionFailed,
    TimedOut,
}

impl ToolCallStatus {
    /// Whether no further transition can happen
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ToolCallStatus::Succeeded
                | ToolCallStatus::ValidationFailed
                | ToolCallStatus::ExecutionFailed
                | ToolCallStatus::TimedOut
        )
    }
}

/// Result of executing a tool
#[derive(Debug)]
pub struct ToolResult {
    pub tool_name: String,
    /// Id of the model's tool call; empty for direct invocations
    pub call_id: String,
    /// Tool output on success
    pub output: Option<Value>,
    /// Wall-clock time from validation start to completion
    pub execution_time_ms: u64,
    pub status: ToolCallStatus,
    /// Failure, when `throw_on_error` was not set
    pub error: Option<LlmError>,
}

impl ToolResult {
    pub(crate) fn pending(tool_name: impl Into<String>, call_id: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            call_id: call_id.into(),
            output: None,
            execution_time_ms: 0,
            status: ToolCallStatus::Pending,
            error: None,
        }
    }

    /// Result for a call that never reached its tool
    pub(crate) fn failed(
        tool_name: impl Into<String>,
        call_id: impl Into<String>,
        error: LlmError,
    ) -> Self {
        let mut result = Self::pending(tool_name, call_id);
        result.error = Some(error);
        result.advance(ToolCallStatus::ExecutionFailed);
        result
    }

    /// Move to `next`; a terminal status is never left
    pub(crate) fn advance(&mut self, next: ToolCallStatus) {
        if !self.status.is_terminal() {
            self.status = next;
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ToolCallStatus::Succeeded
    }

    /// Content of the tool message sent back to the model
    pub fn to_message_content(&self) -> String {
        match (&self.output, &self.error) {
            (Some(Value::String(s)), None) => s.clone(),
            (Some(output), None) => output.to_string(),
            (_, Some(err)) => json!({ "error": err.to_string() }).to_string(),
            (None, None) => "null".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_status_is_sticky() {
        let mut result = ToolResult::pending("t", "call_1");
        result.advance(ToolCallStatus::Validating);
        result.advance(ToolCallStatus::TimedOut);
        result.advance(ToolCallStatus::Succeeded);
        assert_eq!(result.status, ToolCallStatus::TimedOut);
        assert!(!ToolCallStatus::Executing.is_terminal());
    }

    #[test]
    fn test_message_content() {
        let mut ok = ToolResult::pending("add", "c1");
        ok.output = Some(json!(10.0));
        assert_eq!(ok.to_message_content(), "10.0");

        let mut failed = ToolResult::pending("add", "c2");
        failed.error = Some(LlmError::tool_execution("add", "boom"));
        let content: Value = serde_json::from_str(&failed.to_message_content()).unwrap();
        assert_eq!(content["error"], "Tool 'add' failed: boom");
    }

    #[test]
    fn test_failed_is_terminal() {
        let mut result = ToolResult::failed("ghost", "c3", LlmError::tool_execution("ghost", "missing"));
        result.advance(ToolCallStatus::Succeeded);
        assert_eq!(result.status, ToolCallStatus::ExecutionFailed);
        assert!(result.output.is_none());
    }
}
