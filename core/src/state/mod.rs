mod conversation;
mod store;

pub use conversation::ConversationState;
pub use conversation::Escalation;
pub use conversation::Mode;
pub use conversation::Role;
pub use store::ConversationStore;
pub use store::Delivery;
pub use store::StoredMessage;
