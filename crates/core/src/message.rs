//! Message and Conversation domain types.
//!
//! A run's whole context is one `Conversation`: seeded with a system and a
//! user message, then grown one turn at a time by the agent loop. Messages are
//! never edited or removed once appended, so a transcript can be replayed
//! exactly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConversationError;

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Task framing (issue text, instructions)
    User,
    /// The model
    Assistant,
    /// Agent role and rules
    System,
    /// Tool execution result
    Tool,
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Create a tool result message.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        let mut msg = Self::with_role(Role::Tool, content);
        msg.tool_call_id = Some(tool_call_id.into());
        msg
    }
}

/// A tool call embedded in an assistant message, exactly as the model sent it.
///
/// The arguments are still raw JSON text at this point; they only become a
/// typed `ToolInvocation` once the registry resolves them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageToolCall {
    /// Unique ID for this tool call
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as JSON string
    pub arguments: String,
}

/// An append-only, ordered sequence of messages.
///
/// `append` enforces the tool-result invariant: every tool message must answer
/// a call emitted by the closest preceding assistant message, and each call
/// is answered at most once.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Create a new empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a conversation seeded with the agent's role and the task framing.
    pub fn seeded(system_prompt: impl Into<String>, task_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt), Message::user(task_prompt)],
        }
    }

    /// Append a message to the end of the conversation.
    pub fn append(&mut self, message: Message) -> Result<(), ConversationError> {
        if message.role == Role::Tool {
            self.check_tool_result(&message)?;
        }
        self.messages.push(message);
        Ok(())
    }

    /// All messages, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn check_tool_result(&self, message: &Message) -> Result<(), ConversationError> {
        let call_id = message
            .tool_call_id
            .as_deref()
            .ok_or(ConversationError::MissingToolCallId)?;

        // Walk back over the tool results already answering the last assistant turn.
        let mut answered = Vec::new();
        for prior in self.messages.iter().rev() {
            match prior.role {
                Role::Tool => answered.extend(prior.tool_call_id.as_deref()),
                Role::Assistant => {
                    if !prior.tool_calls.iter().any(|tc| tc.id == call_id) {
                        return Err(ConversationError::UnknownToolCall {
                            tool_call_id: call_id.to_string(),
                        });
                    }
                    if answered.contains(&call_id) {
                        return Err(ConversationError::AlreadyAnswered {
                            tool_call_id: call_id.to_string(),
                        });
                    }
                    return Ok(());
                }
                Role::System | Role::User => break,
            }
        }

        Err(ConversationError::NoPrecedingAssistant {
            tool_call_id: call_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assistant_calling(ids: &[&str]) -> Message {
        let mut msg = Message::assistant("");
        msg.tool_calls = ids
            .iter()
            .map(|id| MessageToolCall {
                id: (*id).to_string(),
                name: "read_file".into(),
                arguments: "{}".into(),
            })
            .collect();
        msg
    }

    #[test]
    fn create_user_message() {
        let msg = Message::user("Hello, agent!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello, agent!");
        assert!(msg.tool_calls.is_empty());
    }

    #[test]
    fn seeded_conversation_has_system_then_user() {
        let conv = Conversation::seeded("You fix bugs.", "Issue: crash on empty input");
        assert_eq!(conv.len(), 2);
        assert_eq!(conv.messages()[0].role, Role::System);
        assert_eq!(conv.messages()[1].role, Role::User);
        assert!(conv.messages()[1].content.contains("crash"));
    }

    #[test]
    fn append_keeps_earlier_messages_unchanged() {
        let mut conv = Conversation::seeded("sys", "task");
        let before: Vec<String> = conv.messages().iter().map(|m| m.id.clone()).collect();

        conv.append(Message::assistant("first")).unwrap();
        conv.append(Message::assistant("second")).unwrap();

        let ids: Vec<&str> = conv.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids.len(), 4);
        assert_eq!(ids[..2], [before[0].as_str(), before[1].as_str()]);
        assert_eq!(conv.messages()[3].content, "second");
    }

    #[test]
    fn tool_result_must_answer_preceding_assistant() {
        let mut conv = Conversation::seeded("sys", "task");
        conv.append(assistant_calling(&["call_1"])).unwrap();
        conv.append(Message::tool_result("call_1", "ok")).unwrap();
        assert_eq!(conv.len(), 4);
    }

    #[test]
    fn tool_result_without_assistant_is_rejected() {
        let mut conv = Conversation::seeded("sys", "task");
        let err = conv.append(Message::tool_result("call_1", "ok")).unwrap_err();
        assert!(matches!(err, ConversationError::NoPrecedingAssistant { .. }));
        assert_eq!(conv.len(), 2);
    }

    #[test]
    fn tool_result_for_unknown_call_is_rejected() {
        let mut conv = Conversation::seeded("sys", "task");
        conv.append(assistant_calling(&["call_1"])).unwrap();
        let err = conv.append(Message::tool_result("call_2", "ok")).unwrap_err();
        assert!(matches!(err, ConversationError::UnknownToolCall { .. }));
    }

    #[test]
    fn tool_call_cannot_be_answered_twice() {
        let mut conv = Conversation::seeded("sys", "task");
        conv.append(assistant_calling(&["call_1", "call_2"])).unwrap();
        conv.append(Message::tool_result("call_1", "ok")).unwrap();
        let err = conv.append(Message::tool_result("call_1", "again")).unwrap_err();
        assert!(matches!(err, ConversationError::AlreadyAnswered { .. }));
        conv.append(Message::tool_result("call_2", "ok")).unwrap();
    }

    #[test]
    fn tool_message_needs_call_id() {
        let mut conv = Conversation::seeded("sys", "task");
        let mut msg = Message::tool_result("x", "ok");
        msg.tool_call_id = None;
        assert_eq!(conv.append(msg), Err(ConversationError::MissingToolCallId));
    }

    #[test]
    fn message_serialization_roundtrip() {
        let msg = Message::tool_result("call_9", "output");
        let json = serde_json::to_string(&msg).unwrap();
        let deserialized: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.role, Role::Tool);
        assert_eq!(deserialized.tool_call_id.as_deref(), Some("call_9"));
    }
}
