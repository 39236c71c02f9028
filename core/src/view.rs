use std::time::Duration;

use scotty_protocol::models::Message;

use crate::sidebar::SidebarEntry;
use crate::state::Escalation;

/// Surface the view controller draws on. The terminal front-end renders to
/// stdout; tests record every call.
pub trait ConversationView {
    /// Remove every rendered message.
    fn clear_messages(&mut self);

    /// Render `message` below the ones already shown and keep it in view.
    fn append_message(&mut self, message: &Message);

    fn clear_input(&mut self);

    fn render_sidebar(&mut self, entries: &[SidebarEntry]);

    /// Rewrite the visible location without navigating.
    fn replace_path(&mut self, path: &str);

    fn set_escalation_control(&mut self, control: EscalationControl);

    /// Show a transient notice that disappears after `notification.ttl`.
    fn notify(&mut self, notification: Notification);
}

/// Label and state of the "redirect to assistant" / "resolve" button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscalationControl {
    pub label: &'static str,
    pub enabled: bool,
}

impl EscalationControl {
    pub fn for_state(escalation: Escalation) -> Self {
        match escalation {
            Escalation::Normal => Self {
                label: "Redirect to Assistant",
                enabled: true,
            },
            Escalation::RedirectedToAssistant => Self {
                label: "Mark as Resolved",
                enabled: true,
            },
            Escalation::Resolved => Self::RESOLVED,
        }
    }

    /// Assistants can only resolve. `armed` means the next click confirms.
    pub fn for_assistant(escalation: Escalation, armed: bool) -> Self {
        match escalation {
            Escalation::Resolved => Self::RESOLVED,
            _ if armed => Self {
                label: "Confirm Resolve",
                enabled: true,
            },
            _ => Self {
                label: "Mark as Resolved",
                enabled: true,
            },
        }
    }

    const RESOLVED: Self = Self {
        label: "Resolved",
        enabled: false,
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub ttl: Duration,
}

impl Notification {
    pub fn assistant_replied(ttl: Duration) -> Self {
        Self {
            message: "An assistant replied to your conversation".to_string(),
            ttl,
        }
    }

    pub fn student_replied(ttl: Duration) -> Self {
        Self {
            message: "The student replied to this conversation".to_string(),
            ttl,
        }
    }
}
