//! Error types for the fixloop domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.
//!
//! Two tiers exist: `ToolError` values are rendered to text and fed back to
//! the model, everything else propagates out of the run.

use thiserror::Error;

/// The top-level error type for all fixloop operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Conversation invariants ---
    #[error("Conversation error: {0}")]
    Conversation(#[from] ConversationError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Errors raised while resolving or executing a single tool call.
///
/// These never abort the loop: the executor renders them into the tool
/// message so the model can react on its next turn.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool_name}: {reason}")]
    InvalidArguments { tool_name: String, reason: String },

    #[error("File error on {path}: {reason}")]
    File { path: String, reason: String },

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationError {
    #[error("Tool message is missing a tool_call_id")]
    MissingToolCallId,

    #[error("Tool result '{tool_call_id}' does not follow an assistant message")]
    NoPrecedingAssistant { tool_call_id: String },

    #[error("Tool result '{tool_call_id}' does not answer a pending tool call")]
    UnknownToolCall { tool_call_id: String },

    #[error("Tool call '{tool_call_id}' was already answered")]
    AlreadyAnswered { tool_call_id: String },
}
