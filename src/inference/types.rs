use serde::{Deserialize, Serialize};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. \
    Answer as accurately and concisely as possible. \
    If you are not sure, say that you don't know. \
    Respond in markdown, and put any code in fenced code blocks tagged with their language.";

/// Who wrote a message (OpenAI chat terminology).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Conversation so far, always starting with the system prompt.
///
/// Append-only apart from [`History::reset`].
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    system_prompt: String,
    messages: Vec<Message>,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}

impl History {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        let system_prompt = system_prompt.into();
        Self {
            messages: vec![Message::new(Role::System, system_prompt.clone())],
            system_prompt,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when only the system prompt is present.
    pub fn is_empty(&self) -> bool {
        self.messages.len() <= 1
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::new(Role::User, content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::new(Role::Assistant, content));
    }

    /// Drop everything but the system prompt.
    pub fn reset(&mut self) {
        self.messages.truncate(1);
        if self.messages.is_empty() {
            self.messages
                .push(Message::new(Role::System, self.system_prompt.clone()));
        }
    }
}

/// A piece of a streamed response.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    /// Text delta. May be empty.
    Content(String),
    /// The provider saw the end-of-response marker.
    Completed,
}
