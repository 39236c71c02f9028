//! Turns a message into the lines printed for it.

use owo_colors::OwoColorize;
use owo_colors::Style;
use pulldown_cmark::CodeBlockKind;
use pulldown_cmark::Event;
use pulldown_cmark::Options;
use pulldown_cmark::Parser;
use pulldown_cmark::Tag;
use pulldown_cmark::TagEnd;
use scotty_protocol::models::Message;
use scotty_protocol::models::Sender;

const BODY_INDENT: &str = "  ";
const CODE_INDENT: &str = "    ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Render bot and assistant bodies as markdown.
    pub markdown: bool,
    /// Emit ANSI styling.
    pub color: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            markdown: true,
            color: false,
        }
    }
}

pub fn sender_label(sender: Sender) -> &'static str {
    match sender {
        Sender::Student => "You",
        Sender::Bot => "Scotty",
        Sender::Assistant => "Assistant",
        Sender::System => "Notice",
    }
}

/// A header line naming the sender followed by the indented body.
pub fn render_message(message: &Message, options: RenderOptions) -> Vec<String> {
    let label = sender_label(message.sender);
    let header = if options.color {
        match message.sender {
            Sender::Student => label.cyan().bold().to_string(),
            Sender::Bot => label.green().bold().to_string(),
            Sender::Assistant => label.magenta().bold().to_string(),
            Sender::System => label.yellow().bold().to_string(),
        }
    } else {
        label.to_string()
    };

    // Only replies are authored in markdown.
    let body = match message.sender {
        Sender::Bot | Sender::Assistant if options.markdown => {
            render_markdown(&message.body, options.color)
        }
        _ => message.body.lines().map(str::to_string).collect(),
    };

    let mut lines = Vec::with_capacity(body.len() + 1);
    lines.push(format!("{header}:"));
    for line in body {
        if line.is_empty() {
            lines.push(line);
        } else {
            lines.push(format!("{BODY_INDENT}{line}"));
        }
    }
    lines
}

pub fn render_markdown(source: &str, color: bool) -> Vec<String> {
    let mut writer = MarkdownWriter::new(color);
    let parser = Parser::new_ext(source, Options::ENABLE_STRIKETHROUGH);
    for event in parser {
        writer.handle(event);
    }
    writer.finish()
}

struct MarkdownWriter {
    color: bool,
    lines: Vec<String>,
    current: String,
    /// Next ordinal for each open list; `None` for bullet lists.
    lists: Vec<Option<u64>>,
    in_code_block: bool,
    strong: usize,
    emphasis: usize,
    heading: bool,
    link_dest: Option<String>,
}

impl MarkdownWriter {
    fn new(color: bool) -> Self {
        Self {
            color,
            lines: Vec::new(),
            current: String::new(),
            lists: Vec::new(),
            in_code_block: false,
            strong: 0,
            emphasis: 0,
            heading: false,
            link_dest: None,
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                let code = format!("`{code}`");
                let styled = if self.color {
                    code.cyan().to_string()
                } else {
                    code
                };
                self.current.push_str(&styled);
            }
            Event::SoftBreak => self.current.push(' '),
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush();
                self.lines.push("---".to_string());
                self.blank();
            }
            Event::Html(html) | Event::InlineHtml(html) => self.current.push_str(&html),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { .. } => {
                self.flush();
                self.heading = true;
            }
            Tag::CodeBlock(kind) => {
                self.flush();
                self.in_code_block = true;
                if let CodeBlockKind::Fenced(lang) = kind
                    && !lang.is_empty()
                {
                    self.lines.push(format!("{CODE_INDENT}[{lang}]"));
                }
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(next)) => {
                        let marker = format!("{next}. ");
                        *next += 1;
                        marker
                    }
                    _ => "- ".to_string(),
                };
                self.current = format!("{}{marker}", "  ".repeat(depth));
            }
            Tag::Strong => self.strong += 1,
            Tag::Emphasis => self.emphasis += 1,
            Tag::Link { dest_url, .. } => self.link_dest = Some(dest_url.to_string()),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::Heading(_) => {
                self.flush();
                self.heading = false;
                self.blank();
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.blank();
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::Item => self.flush(),
            TagEnd::Strong => self.strong = self.strong.saturating_sub(1),
            TagEnd::Emphasis => self.emphasis = self.emphasis.saturating_sub(1),
            TagEnd::Link => {
                if let Some(dest) = self.link_dest.take() {
                    self.current.push_str(&format!(" ({dest})"));
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_code_block {
            for line in text.lines() {
                let line = format!("{CODE_INDENT}{line}");
                if self.color {
                    self.lines.push(line.dimmed().to_string());
                } else {
                    self.lines.push(line);
                }
            }
            return;
        }
        if !self.color {
            self.current.push_str(text);
            return;
        }
        let mut style = Style::new();
        if self.strong > 0 || self.heading {
            style = style.bold();
        }
        if self.emphasis > 0 {
            style = style.italic();
        }
        self.current.push_str(&text.style(style).to_string());
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(std::mem::take(&mut self.current));
        }
    }

    fn blank(&mut self) {
        if self.lines.last().is_some_and(|line| !line.is_empty()) {
            self.lines.push(String::new());
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        while self.lines.last().is_some_and(String::is_empty) {
            self.lines.pop();
        }
        self.lines
    }
}
