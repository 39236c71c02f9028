use std::io::Write;

use owo_colors::OwoColorize;
use scotty_core::sidebar::SidebarEntry;
use scotty_core::view::ConversationView;
use scotty_core::view::EscalationControl;
use scotty_core::view::Notification;
use scotty_protocol::models::Message;
use tracing::debug;
use tracing::warn;

use crate::render::RenderOptions;
use crate::render::render_message;

/// Line-oriented [`ConversationView`] that prints to a writer, normally
/// stdout. The terminal cannot un-print, so clearing draws a divider.
pub struct TerminalView<W: Write> {
    out: W,
    options: RenderOptions,
    path: Option<String>,
    control: Option<EscalationControl>,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W, options: RenderOptions) -> Self {
        Self {
            out,
            options,
            path: None,
            control: None,
        }
    }

    /// Location last set through [`ConversationView::replace_path`].
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn control(&self) -> Option<EscalationControl> {
        self.control
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print a line that is not part of the conversation.
    pub fn info(&mut self, line: &str) {
        let line = if self.options.color {
            line.dimmed().to_string()
        } else {
            line.to_string()
        };
        self.write_lines(&[line]);
    }

    fn write_lines(&mut self, lines: &[String]) {
        let result = lines
            .iter()
            .try_for_each(|line| writeln!(self.out, "{line}"))
            .and_then(|()| self.out.flush());
        if let Err(e) = result {
            warn!("failed to write to terminal: {e}");
        }
    }
}

impl<W: Write> ConversationView for TerminalView<W> {
    fn clear_messages(&mut self) {
        let divider = "-".repeat(40);
        self.write_lines(&[String::new(), divider]);
    }

    fn append_message(&mut self, message: &Message) {
        let mut lines = render_message(message, self.options);
        lines.push(String::new());
        self.write_lines(&lines);
    }

    fn clear_input(&mut self) {
        // Input is line-buffered by the terminal; nothing to erase.
    }

    fn render_sidebar(&mut self, entries: &[SidebarEntry]) {
        if entries.is_empty() {
            self.info("No conversations yet.");
            return;
        }
        let mut lines = vec!["Conversations:".to_string()];
        for entry in entries {
            let marker = if entry.active { '*' } else { ' ' };
            let row = format!(
                "{marker} {:>5}  {}",
                entry.summary.id.0, entry.summary.label
            );
            lines.push(if entry.active && self.options.color {
                row.bold().to_string()
            } else {
                row
            });
        }
        lines.push(String::new());
        self.write_lines(&lines);
    }

    fn replace_path(&mut self, path: &str) {
        debug!("location is now {path}");
        self.path = Some(path.to_string());
        self.info(&format!("[{path}]"));
    }

    fn set_escalation_control(&mut self, control: EscalationControl) {
        if self.control == Some(control) {
            return;
        }
        self.control = Some(control);
        let hint = if control.enabled {
            format!("Type /escalate to {}.", control.label.to_lowercase())
        } else {
            format!("{}.", control.label)
        };
        self.info(&hint);
    }

    fn notify(&mut self, notification: Notification) {
        // Printed lines cannot expire; the ttl only matters to views that can
        // take a notice back down.
        let line = format!(">> {}", notification.message);
        let line = if self.options.color {
            line.yellow().bold().to_string()
        } else {
            line
        };
        self.write_lines(&[line, String::new()]);
    }
}
