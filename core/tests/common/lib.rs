use scotty_core::config::Config;
use scotty_core::config::ConfigOverrides;
use scotty_core::config::ConfigToml;
use scotty_core::sidebar::SidebarEntry;
use scotty_core::view::ConversationView;
use scotty_core::view::EscalationControl;
use scotty_core::view::Notification;
use scotty_protocol::models::Message;
use scotty_protocol::models::Sender;
use tempfile::TempDir;

pub mod test_scotty;

/// Returns a default `Config` rooted at `scotty_home` and pointed at
/// `base_url`, ignoring any `config.toml` on the machine running the tests.
pub fn load_default_config_for_test(scotty_home: &TempDir, base_url: &str) -> Config {
    Config::load_from_base_config_with_overrides(
        ConfigToml::default(),
        ConfigOverrides {
            base_url: Some(base_url.to_string()),
            ..Default::default()
        },
        scotty_home.path().to_path_buf(),
    )
    .expect("defaults for test should always succeed")
}

/// Everything a [`RecordingView`] was asked to draw, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    ClearMessages,
    Append(Message),
    ClearInput,
    Sidebar(Vec<SidebarEntry>),
    Path(String),
    Control(EscalationControl),
    Notify(Notification),
}

#[derive(Debug, Default)]
pub struct RecordingView {
    pub events: Vec<ViewEvent>,
}

impl RecordingView {
    /// Messages currently on screen, i.e. appended since the last clear.
    pub fn visible_messages(&self) -> Vec<Message> {
        let start = self
            .events
            .iter()
            .rposition(|event| matches!(event, ViewEvent::ClearMessages))
            .map_or(0, |index| index + 1);
        self.events[start..]
            .iter()
            .filter_map(|event| match event {
                ViewEvent::Append(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn visible_from(&self, sender: Sender) -> Vec<String> {
        self.visible_messages()
            .into_iter()
            .filter(|message| message.sender == sender)
            .map(|message| message.body)
            .collect()
    }

    pub fn last_path(&self) -> Option<&str> {
        self.events.iter().rev().find_map(|event| match event {
            ViewEvent::Path(path) => Some(path.as_str()),
            _ => None,
        })
    }

    pub fn last_sidebar(&self) -> Option<&[SidebarEntry]> {
        self.events.iter().rev().find_map(|event| match event {
            ViewEvent::Sidebar(entries) => Some(entries.as_slice()),
            _ => None,
        })
    }

    pub fn last_control(&self) -> Option<EscalationControl> {
        self.events.iter().rev().find_map(|event| match event {
            ViewEvent::Control(control) => Some(*control),
            _ => None,
        })
    }

    pub fn notifications(&self) -> Vec<&Notification> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ViewEvent::Notify(notification) => Some(notification),
                _ => None,
            })
            .collect()
    }
}

impl ConversationView for RecordingView {
    fn clear_messages(&mut self) {
        self.events.push(ViewEvent::ClearMessages);
    }

    fn append_message(&mut self, message: &Message) {
        self.events.push(ViewEvent::Append(message.clone()));
    }

    fn clear_input(&mut self) {
        self.events.push(ViewEvent::ClearInput);
    }

    fn render_sidebar(&mut self, entries: &[SidebarEntry]) {
        self.events.push(ViewEvent::Sidebar(entries.to_vec()));
    }

    fn replace_path(&mut self, path: &str) {
        self.events.push(ViewEvent::Path(path.to_string()));
    }

    fn set_escalation_control(&mut self, control: EscalationControl) {
        self.events.push(ViewEvent::Control(control));
    }

    fn notify(&mut self, notification: Notification) {
        self.events.push(ViewEvent::Notify(notification));
    }
}
