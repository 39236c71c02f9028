use serde::Deserialize;
use serde::Serialize;

/// JSON bodies posted to the conversation endpoints. The backend dispatches
/// on the `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationRequest {
    /// List the ids (and titles) of the user's conversations.
    Ids,
    /// Load every message of a conversation.
    Conversation,
    /// Create a conversation whose first message is `message`.
    Create { message: String },
    /// Store a student message.
    Send { message: String },
    /// Ask the bot to answer `message`.
    Reply { message: String },
    /// Posted to the conversation endpoint this queries the escalation
    /// status; posted to `/redirect` it escalates the conversation.
    Redirect,
    Resolve,
    /// Store a message written by course staff. Posted to the assistant
    /// endpoint of a conversation.
    AssistantMessage { message: String },
}
