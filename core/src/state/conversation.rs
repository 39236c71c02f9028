use scotty_protocol::models::ConversationId;
use scotty_protocol::responses::RedirectStatus;

use super::ConversationStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// No conversation exists yet; the first submit creates one.
    New,
    Existing,
}

/// Who is looking at the conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Role {
    /// Asks questions and gets chatbot replies.
    #[default]
    Student,
    /// Answers a conversation that was redirected to course staff.
    Assistant,
}

/// Hand-off state of a conversation. Only ever moves forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Escalation {
    #[default]
    Normal,
    RedirectedToAssistant,
    Resolved,
}

impl Escalation {
    /// Local state matching the backend's report, if it names one.
    pub fn from_redirect_status(status: RedirectStatus) -> Option<Self> {
        match status {
            RedirectStatus::Bot => Some(Escalation::Normal),
            RedirectStatus::Open => Some(Escalation::RedirectedToAssistant),
            RedirectStatus::Closed => Some(Escalation::Resolved),
            RedirectStatus::Unknown => None,
        }
    }
}

/// Everything the view controller knows about the conversation on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationState {
    conversation_id: Option<ConversationId>,
    store: ConversationStore,
    escalation: Escalation,
}

impl ConversationState {
    pub fn new_conversation() -> Self {
        Self {
            conversation_id: None,
            store: ConversationStore::new(),
            escalation: Escalation::Normal,
        }
    }

    pub fn existing(id: ConversationId) -> Self {
        Self {
            conversation_id: Some(id),
            ..Self::new_conversation()
        }
    }

    pub fn mode(&self) -> Mode {
        match self.conversation_id {
            Some(_) => Mode::Existing,
            None => Mode::New,
        }
    }

    pub fn conversation_id(&self) -> Option<ConversationId> {
        self.conversation_id
    }

    /// Attach the id the backend assigned. Returns false (and changes
    /// nothing) once an id is already bound.
    pub fn bind(&mut self, id: ConversationId) -> bool {
        if let Some(existing) = self.conversation_id {
            tracing::warn!("conversation {existing} already bound; ignoring {id}");
            return false;
        }
        self.conversation_id = Some(id);
        true
    }

    pub fn escalation(&self) -> Escalation {
        self.escalation
    }

    /// Move escalation forward to `target`. Returns whether it changed.
    pub fn advance_escalation(&mut self, target: Escalation) -> bool {
        if target > self.escalation {
            self.escalation = target;
            true
        } else {
            false
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ConversationStore {
        &mut self.store
    }
}
