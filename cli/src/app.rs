use std::io::Write;

use scotty_core::PollTick;
use scotty_core::ViewController;
use scotty_protocol::models::ConversationId;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::info;

use crate::terminal::TerminalView;

pub(crate) const HELP: &str = "Commands: /escalate, /open <id>, /list, /help, /quit. Anything else is sent as a message.";

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InputCommand {
    Submit(String),
    Escalate,
    Open(ConversationId),
    List,
    Help,
    Quit,
    Invalid(String),
}

pub(crate) fn parse_input(line: &str) -> InputCommand {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix('/') else {
        return InputCommand::Submit(line.to_string());
    };
    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some("escalate" | "resolve"), None, None) => InputCommand::Escalate,
        (Some("open"), Some(id), None) => match id.parse::<i64>() {
            Ok(id) => InputCommand::Open(ConversationId(id)),
            Err(_) => InputCommand::Invalid(format!("Not a conversation id: {id}")),
        },
        (Some("list"), None, None) => InputCommand::List,
        (Some("help"), None, None) => InputCommand::Help,
        (Some("quit" | "exit"), None, None) => InputCommand::Quit,
        _ => InputCommand::Invalid(format!("Unknown command: {trimmed}. {HELP}")),
    }
}

/// Drive `controller` until the input ends or the user quits.
///
/// Input lines and poll ticks are handled one at a time, so a tick that
/// arrives during a send/reply round trip waits until the round trip is
/// done.
pub(crate) async fn run_event_loop<W, R>(
    controller: &mut ViewController<TerminalView<W>>,
    mut poll_rx: mpsc::Receiver<PollTick>,
    input: R,
) -> anyhow::Result<()>
where
    W: Write,
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("input closed");
                    break;
                };
                match parse_input(&line) {
                    InputCommand::Submit(text) => controller.handle_submit(&text).await,
                    InputCommand::Escalate => controller.handle_escalation_click().await,
                    InputCommand::Open(id) => controller.select_conversation(id).await,
                    InputCommand::List => controller.refresh_sidebar().await,
                    InputCommand::Help => controller.view_mut().info(HELP),
                    InputCommand::Invalid(reason) => controller.view_mut().info(&reason),
                    InputCommand::Quit => break,
                }
            }
            Some(tick) = poll_rx.recv() => controller.on_poll_tick(tick).await,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }
    controller.teardown().await;
    Ok(())
}
