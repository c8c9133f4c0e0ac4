//! Tool registration and execution
//!
//! ```text
//! model response ──► ToolCall[] ──► ToolRegistry::execute_tools
//!                                     │ resolve under one read lock
//!                                     │ validate input (JSON Schema)
//!                                     │ spawn tool body, race timeout
//!                                     ▼
//!                                   ToolResult[] (call order)
//! ```

mod registry;
mod result;
mod tool;

pub use registry::{ExecuteOptions, ToolRegistry, ToolRegistryConfig};
pub use result::{ToolCallStatus, ToolResult};
pub use tool::{Tool, ToolHandler};
