//! Chat message format for the chat-completion endpoint.

use serde::{Deserialize, Serialize};

/// Unified message structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: text.into(),
        }
    }

    /// Build the conversation for one completion: an optional system turn, then the user turn.
    ///
    /// A blank system instruction is treated as absent.
    pub fn conversation(system: Option<&str>, user: impl Into<String>) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2);
        if let Some(sys) = system.filter(|s| !s.trim().is_empty()) {
            messages.push(Message::system(sys));
        }
        messages.push(Message::user(user));
        messages
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_value(Message::system("be terse")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "system", "content": "be terse"}));
    }

    #[test]
    fn test_conversation_with_system() {
        let msgs = Message::conversation(Some("sys"), "hi");
        assert_eq!(msgs, vec![Message::system("sys"), Message::user("hi")]);
    }

    #[test]
    fn test_conversation_skips_blank_system() {
        assert_eq!(Message::conversation(Some("   "), "hi"), vec![Message::user("hi")]);
        assert_eq!(Message::conversation(None, "hi"), vec![Message::user("hi")]);
    }
}
