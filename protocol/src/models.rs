use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Backend label for messages written by the student.
pub const STUDENT_MESSAGE_LABEL: &str = "StudentMessage";
/// Backend label for messages written by the chatbot.
pub const BOT_MESSAGE_LABEL: &str = "BotMessage";
/// Backend label for messages written by a human assistant.
pub const ASSISTANT_MESSAGE_LABEL: &str = "AssistantMessage";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub i64);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ConversationId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(pub i64);

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for CourseId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Who wrote a message. `System` is never produced by the backend; it marks
/// notices generated by the client itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    Student,
    Bot,
    Assistant,
    System,
}

impl Sender {
    /// Decode the backend's sender label. Anything that is not a student or
    /// assistant label designates the bot, including a missing label.
    pub fn from_wire_label(label: Option<&str>) -> Self {
        match label {
            Some(STUDENT_MESSAGE_LABEL) => Sender::Student,
            Some(ASSISTANT_MESSAGE_LABEL) => Sender::Assistant,
            Some(BOT_MESSAGE_LABEL) | None => Sender::Bot,
            Some(other) => {
                tracing::warn!("unknown sender label {other:?}; treating as bot");
                Sender::Bot
            }
        }
    }

    /// Label the backend uses for this sender, if it has one.
    pub fn wire_label(self) -> Option<&'static str> {
        match self {
            Sender::Student => Some(STUDENT_MESSAGE_LABEL),
            Sender::Bot => Some(BOT_MESSAGE_LABEL),
            Sender::Assistant => Some(ASSISTANT_MESSAGE_LABEL),
            Sender::System => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub body: String,
}

impl Message {
    pub fn new(sender: Sender, body: impl Into<String>) -> Self {
        Self {
            sender,
            body: body.into(),
        }
    }

    pub fn student(body: impl Into<String>) -> Self {
        Self::new(Sender::Student, body)
    }

    pub fn bot(body: impl Into<String>) -> Self {
        Self::new(Sender::Bot, body)
    }

    pub fn assistant(body: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, body)
    }

    pub fn system(body: impl Into<String>) -> Self {
        Self::new(Sender::System, body)
    }
}

/// One entry in the conversation sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub label: String,
}

impl ConversationSummary {
    /// Build a summary from what the backend reported. Blank or missing
    /// titles fall back to "Conversation {id}".
    pub fn new(id: ConversationId, title: Option<&str>) -> Self {
        let label = match title.map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => default_label(id),
        };
        Self { id, label }
    }
}

pub fn default_label(id: ConversationId) -> String {
    format!("Conversation {id}")
}

/// Path shown in the address bar for an existing conversation.
pub fn conversation_path(id: ConversationId) -> String {
    format!("/conversation/{id}")
}
