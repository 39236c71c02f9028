mod app;
mod cli;
pub mod render;
pub mod terminal;

use std::fs::OpenOptions;
use std::sync::Arc;
use std::time::Duration;

pub use cli::Cli;
use scotty_core::ControllerOptions;
use scotty_core::HttpBackend;
use scotty_core::PageContext;
use scotty_core::ViewController;
use scotty_core::config::Config;
use scotty_core::config::ConfigOverrides;
use scotty_core::poll_channel;
use scotty_core::state::Role;
use scotty_protocol::models::ConversationId;
use scotty_protocol::models::CourseId;
use supports_color::Stream;
use tokio::io::BufReader;
use tracing::info;
use tracing_appender::non_blocking;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::render::RenderOptions;
use crate::terminal::TerminalView;

const LOG_FILE: &str = "scotty.log";

pub async fn run_main(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        base_url,
        course,
        conversation,
        assistant,
        no_markdown,
        poll_interval_ms,
        scotty_home,
    } = cli;

    let overrides = ConfigOverrides {
        base_url,
        poll_interval: poll_interval_ms.map(Duration::from_millis),
        render_markdown: no_markdown.then_some(false),
        scotty_home,
    };
    let config = Config::load_with_overrides(overrides)?;

    let log_dir = config.log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let mut log_file_opts = OpenOptions::new();
    log_file_opts.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        log_file_opts.mode(0o600);
    }
    let log_file = log_file_opts.open(log_dir.join(LOG_FILE))?;

    // Keep the guard alive so buffered log lines are written on exit.
    let (non_blocking, _guard) = non_blocking(log_file);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("scotty_core=info,scotty_cli=info"));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_target(false)
        .with_ansi(false)
        .with_filter(env_filter);
    let _ = tracing_subscriber::registry().with(file_layer).try_init();

    info!("starting scotty against {}", config.base_url);

    let render = RenderOptions {
        markdown: config.render_markdown,
        color: supports_color::on(Stream::Stdout).is_some(),
    };
    let mut view = TerminalView::new(std::io::stdout(), render);
    view.info(app::HELP);

    let backend = Arc::new(HttpBackend::new(&config));
    let (poll_tx, poll_rx) = poll_channel();
    let mut controller =
        ViewController::new(backend, view, poll_tx, ControllerOptions::from(&config));

    controller
        .initialize(PageContext {
            conversation_id: conversation.map(ConversationId),
            course_id: course.map(CourseId),
            role: if assistant {
                Role::Assistant
            } else {
                Role::Student
            },
        })
        .await;

    let stdin = BufReader::new(tokio::io::stdin());
    app::run_event_loop(&mut controller, poll_rx, stdin).await
}
