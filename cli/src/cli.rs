use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(version, about = "Terminal client for the course chatbot")]
pub struct Cli {
    /// Root URL of the chatbot backend. Overrides `base_url` in config.toml.
    #[arg(long = "base-url", value_name = "URL")]
    pub base_url: Option<String>,

    /// Course to start new conversations in.
    #[arg(long, value_name = "COURSE_ID")]
    pub course: Option<i64>,

    /// Open an existing conversation instead of starting a new one.
    #[arg(long, value_name = "CONVERSATION_ID")]
    pub conversation: Option<i64>,

    /// Answer the conversation as course staff: messages go out as the
    /// assistant, no chatbot reply is requested and /escalate resolves.
    #[arg(long, requires = "conversation", default_value_t = false)]
    pub assistant: bool,

    /// Print message bodies verbatim instead of rendering markdown.
    #[arg(long = "no-markdown", default_value_t = false)]
    pub no_markdown: bool,

    /// How often to check the open conversation for assistant replies.
    #[arg(long = "poll-interval-ms", value_name = "MILLIS")]
    pub poll_interval_ms: Option<u64>,

    /// Directory holding config.toml and logs. Defaults to $SCOTTY_HOME or
    /// ~/.scotty.
    #[arg(long = "home", value_name = "DIR")]
    pub scotty_home: Option<PathBuf>,
}
