//! Tool catalog: the closed set of operations the model may request.
//!
//! The model names a tool with a string and passes JSON arguments. The
//! registry turns that pair into a typed `ToolInvocation` (or a `ToolError`)
//! before anything with side effects runs.

use serde::{Deserialize, Serialize};
use crate::error::ToolError;
use crate::message::MessageToolCall;
use crate::provider::ToolDefinition;

/// Every tool fixloop knows how to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    ReadFile,
    WriteFile,
    RunTests,
}

impl ToolKind {
    pub const ALL: [ToolKind; 3] = [ToolKind::ReadFile, ToolKind::WriteFile, ToolKind::RunTests];

    /// The name the model uses to call this tool.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::ReadFile => "read_file",
            ToolKind::WriteFile => "write_file",
            ToolKind::RunTests => "run_tests",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolKind::ReadFile => "Read the contents of a file at the given path.",
            ToolKind::WriteFile => {
                "Write content to a file. Creates the file if it doesn't exist, overwrites if it does."
            }
            ToolKind::RunTests => {
                "Run the project's test suite and return the combined stdout/stderr output."
            }
        }
    }

    /// JSON Schema describing this tool's parameters.
    pub fn parameters_schema(&self) -> serde_json::Value {
        match self {
            ToolKind::ReadFile => serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "The file path to read"
                    }
                },
                "required": ["path"]
            }),
            ToolKind::WriteFile => serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "The file path to write to"
                    },
                    "content": {
                        "type": "string",
                        "description": "The full new content of the file"
                    }
                },
                "required": ["path", "content"]
            }),
            ToolKind::RunTests => serde_json::json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }

    /// Validate a raw JSON argument payload into this tool's typed arguments.
    ///
    /// An empty payload counts as `{}`. Tools without parameters ignore the
    /// payload entirely, even when it is not valid JSON.
    pub fn parse_arguments(&self, raw: &str) -> Result<ToolArgs, ToolError> {
        let raw = match raw.trim() {
            "" => "{}",
            trimmed => trimmed,
        };
        let invalid = |e: serde_json::Error| ToolError::InvalidArguments {
            tool_name: self.name().to_string(),
            reason: e.to_string(),
        };

        match self {
            ToolKind::ReadFile => serde_json::from_str(raw).map(ToolArgs::ReadFile).map_err(invalid),
            ToolKind::WriteFile => serde_json::from_str(raw).map(ToolArgs::WriteFile).map_err(invalid),
            ToolKind::RunTests => Ok(ToolArgs::RunTests),
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadFileArgs {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteFileArgs {
    pub path: String,
    pub content: String,
}

/// Validated, typed arguments, one variant per tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolArgs {
    ReadFile(ReadFileArgs),
    WriteFile(WriteFileArgs),
    RunTests,
}

/// A tool call that named a registered tool and passed schema validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Unique call ID (matches the LLM's tool_call.id)
    pub id: String,

    /// Typed arguments; also determines which tool runs
    pub args: ToolArgs,
}

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// Whether the tool executed successfully
    pub success: bool,

    /// The output content
    pub output: String,
}

/// The set of tools offered to the model for a run.
///
/// The agent loop uses this to:
/// 1. Get tool definitions to send to the LLM
/// 2. Resolve the model's tool calls into typed invocations
///
/// Registration order is preserved in `definitions()`.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolKind>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry offering every known tool.
    pub fn standard() -> Self {
        Self::with_tools(ToolKind::ALL)
    }

    pub fn with_tools(tools: impl IntoIterator<Item = ToolKind>) -> Self {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool);
        }
        registry
    }

    /// Register a tool. Registering the same tool twice is a no-op.
    pub fn register(&mut self, tool: ToolKind) {
        if !self.tools.contains(&tool) {
            self.tools.push(tool);
        }
    }

    pub fn contains(&self, tool: ToolKind) -> bool {
        self.tools.contains(&tool)
    }

    /// Get all tool definitions (for sending to the LLM).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Turn a raw model tool call into a validated invocation.
    ///
    /// Names that are not registered (even if fixloop knows the tool) are
    /// rejected as `UnknownTool`.
    pub fn resolve(&self, call: &MessageToolCall) -> Result<ToolInvocation, ToolError> {
        let kind = self
            .kind_of(&call.name)
            .ok_or_else(|| ToolError::UnknownTool(call.name.clone()))?;
        Ok(ToolInvocation {
            id: call.id.clone(),
            args: kind.parse_arguments(&call.arguments)?,
        })
    }

    fn kind_of(&self, name: &str) -> Option<ToolKind> {
        ToolKind::from_name(name).filter(|k| self.contains(*k))
    }
}
