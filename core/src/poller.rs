use std::time::Duration;

use scotty_protocol::models::ConversationId;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use tracing::trace;

/// Request to re-fetch `conversation_id`, delivered to the event loop that
/// owns the view controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTick {
    pub conversation_id: ConversationId,
}

/// Channel pair for poll ticks. Capacity one: a tick that has not been
/// handled yet suppresses the next, so polls never pile up behind a slow
/// request.
pub fn poll_channel() -> (mpsc::Sender<PollTick>, mpsc::Receiver<PollTick>) {
    mpsc::channel(1)
}

/// Fixed-interval timer driving the polling monitor for one conversation.
///
/// Acquired when a conversation becomes `Existing`, released by [`Poller::stop`]
/// or on drop.
pub struct Poller {
    conversation_id: ConversationId,
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Poller {
    pub fn spawn(
        conversation_id: ConversationId,
        interval: Duration,
        tick_tx: mpsc::Sender<PollTick>,
    ) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately; the conversation was just
            // loaded, so wait a full period before polling.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = interval.tick() => {
                        match tick_tx.try_send(PollTick { conversation_id }) {
                            Ok(()) => {}
                            Err(TrySendError::Full(_)) => {
                                trace!("previous poll of {conversation_id} still pending; skipping tick");
                            }
                            Err(TrySendError::Closed(_)) => break,
                        }
                    }
                }
            }
            debug!("poller for conversation {conversation_id} stopped");
        });

        Self {
            conversation_id,
            stop_tx: Some(stop_tx),
            task: Some(task),
        }
    }

    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    pub async fn stop(mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
            && !e.is_cancelled()
        {
            tracing::warn!("poller task ended abnormally: {e}");
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
