//! Tool handlers and the executor that dispatches to them.
//!
//! The executor is the boundary between the model's untyped tool calls and
//! real side effects:
//!
//! 1. Resolve the call against the registry (unknown name, bad arguments → `ToolError`)
//! 2. Dispatch the typed invocation to exactly one handler
//! 3. Render success or failure as the text the model sees next turn
//!
//! `execute` therefore never returns an error.

pub mod file_read;
pub mod file_write;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use fixloop_config::ToolsConfig;
use fixloop_core::error::ToolError;
use fixloop_core::message::MessageToolCall;
use fixloop_core::tool::{ToolArgs, ToolInvocation, ToolRegistry, ToolResult};
use tracing::{debug, warn};

pub use file_write::WRITE_ACK;
pub use run_tests::{CommandTestRunner, TestRunner};

/// Everything a handler may touch, constructed once per run.
#[derive(Clone)]
pub struct ToolContext {
    /// Relative tool paths resolve against this directory
    pub workspace_root: PathBuf,

    /// Runs the project's test suite
    pub test_runner: Arc<dyn TestRunner>,
}

impl ToolContext {
    pub fn new(workspace_root: impl Into<PathBuf>, test_runner: Arc<dyn TestRunner>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            test_runner,
        }
    }

    /// Build the context from the `[tools]` config section.
    pub fn from_config(config: &ToolsConfig) -> Result<Self, ToolError> {
        let runner = CommandTestRunner::from_command(&config.test_command).ok_or_else(|| {
            ToolError::ExecutionFailed {
                tool_name: "run_tests".into(),
                reason: "tools.test_command is empty".into(),
            }
        })?;
        Ok(Self::new(config.workspace_root.clone(), Arc::new(runner)))
    }
}

/// Join a relative path onto the workspace root; absolute paths pass through.
pub(crate) fn resolve_path(root: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Maps a tool call to its side effect and a textual result.
pub struct ToolExecutor {
    registry: ToolRegistry,
    context: ToolContext,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry, context: ToolContext) -> Self {
        Self { registry, context }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Resolve and run one model tool call. Failures become the result text.
    pub async fn execute(&self, call: &MessageToolCall) -> ToolResult {
        let start = Instant::now();
        let outcome = match self.registry.resolve(call) {
            Ok(invocation) => self.dispatch(&invocation).await,
            Err(e) => Err(e),
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(output) => {
                debug!(tool = %call.name, duration_ms, bytes = output.len(), "Tool executed");
                ToolResult {
                    call_id: call.id.clone(),
                    success: true,
                    output,
                }
            }
            Err(e) => {
                warn!(tool = %call.name, error = %e, duration_ms, "Tool execution failed");
                ToolResult {
                    call_id: call.id.clone(),
                    success: false,
                    output: render_error(&e),
                }
            }
        }
    }

    /// Run a validated invocation against its handler.
    pub async fn dispatch(&self, invocation: &ToolInvocation) -> Result<String, ToolError> {
        let root = &self.context.workspace_root;
        match &invocation.args {
            ToolArgs::ReadFile(args) => file_read::read_file(root, args).await,
            ToolArgs::WriteFile(args) => file_write::write_file(root, args).await,
            ToolArgs::RunTests => Ok(self.context.test_runner.run(root).await),
        }
    }
}

/// The text the model sees for a failed call.
pub fn render_error(error: &ToolError) -> String {
    match error {
        ToolError::UnknownTool(_) => error.to_string(),
        other => format!("Error: {other}"),
    }
}
