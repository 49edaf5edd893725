use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    Assistant,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Per-session dialogue state. The transcript only ever grows.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    user_name: Option<String>,
    transcript: Vec<ChatMessage>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, role: ChatRole, content: impl Into<String>) {
        self.transcript.push(ChatMessage::new(role, content));
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn set_user_name(&mut self, name: &str) {
        let name = name.trim();
        if !name.is_empty() {
            self.user_name = Some(name.to_string());
        }
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }
}
