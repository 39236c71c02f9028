use serde::Deserialize;
use serde::Serialize;

use crate::models::ConversationId;
use crate::models::ConversationSummary;
use crate::models::Message;
use crate::models::Sender;

/// One element of the `{type:"ids"}` listing. Older backends return bare
/// ids; newer ones return `{id, title}` objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListingEntry {
    Id(ConversationId),
    Titled {
        id: ConversationId,
        #[serde(default)]
        title: Option<String>,
    },
}

impl ListingEntry {
    pub fn into_summary(self) -> ConversationSummary {
        match self {
            ListingEntry::Id(id) => ConversationSummary::new(id, None),
            ListingEntry::Titled { id, title } => ConversationSummary::new(id, title.as_deref()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(default)]
    pub sender: Option<String>,
    pub body: String,
}

impl From<WireMessage> for Message {
    fn from(value: WireMessage) -> Self {
        Message::new(Sender::from_wire_label(value.sender.as_deref()), value.body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadConversationResponse {
    pub messages: Vec<WireMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateConversationResponse {
    #[serde(rename = "conversationId")]
    pub conversation_id: ConversationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyResponse {
    pub reply: String,
}

/// Body returned by the redirect and resolve endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Escalation status as reported by `{type:"redirect"}` on the conversation
/// endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectStatus {
    /// Still handled by the bot.
    Bot,
    /// Redirected to an assistant and not yet resolved.
    Open,
    /// Resolved.
    Closed,
    /// The backend could not find the conversation.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
enum RawRedirect {
    Label(String),
    Flag(bool),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectStatusResponse {
    redirect: RawRedirect,
}

impl RedirectStatusResponse {
    pub fn status(&self) -> RedirectStatus {
        match &self.redirect {
            RawRedirect::Label(label) => match label.as_str() {
                "bot" => RedirectStatus::Bot,
                "open" => RedirectStatus::Open,
                "closed" => RedirectStatus::Closed,
                _ => RedirectStatus::Unknown,
            },
            RawRedirect::Flag(_) => RedirectStatus::Unknown,
        }
    }
}

/// Structured failure body. Either field may carry the reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}
