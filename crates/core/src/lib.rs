//! # fixloop Core
//!
//! Domain types, traits, and error definitions for the fixloop issue-fixing agent.
//! This crate has **no I/O**; it defines the domain model that the provider,
//! tool, agent and GitHub crates implement against.
//!
//! ## Design Philosophy
//!
//! The LLM backend is a trait (`Provider`) so the agent loop can be driven by
//! a scripted fake in tests. The tool set, on the other hand, is a closed enum
//! (`ToolKind`): the model names a tool with a string, and that string is
//! turned into a typed invocation at the boundary or rejected with a typed
//! error.

pub mod error;
pub mod issue;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{ConversationError, Error, ProviderError, Result, ToolError};
pub use issue::{Issue, IssueOrigin};
pub use message::{Conversation, Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolChoice, ToolDefinition, Usage};
pub use tool::{ReadFileArgs, ToolArgs, ToolInvocation, ToolKind, ToolRegistry, ToolResult, WriteFileArgs};
