//! Conversation view controller.
//!
//! Reconciles conversation identity, message history, creation of new
//! conversations, polling and escalation into what the [`ConversationView`]
//! shows. Every operation runs to completion, network round trips included,
//! before the owning event loop hands it the next event. A poll tick is
//! therefore never handled while a send/reply round trip is outstanding, and
//! by the time it is, the delivered count already covers the student message
//! and the reply.

use std::sync::Arc;
use std::time::Duration;

use scotty_protocol::models::ConversationId;
use scotty_protocol::models::ConversationSummary;
use scotty_protocol::models::CourseId;
use scotty_protocol::models::Message;
use scotty_protocol::models::Sender;
use scotty_protocol::models::conversation_path;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::info;
use tracing::trace;
use tracing::warn;

use crate::backend::ChatBackend;
use crate::backend::ListScope;
use crate::backend::is_not_found;
use crate::config::Config;
use crate::config::DEFAULT_NOTIFICATION_TTL;
use crate::config::DEFAULT_POLL_INTERVAL;
use crate::error::ChatErr;
use crate::error::Failure;
use crate::poller::PollTick;
use crate::poller::Poller;
use crate::sidebar::SidebarRegistry;
use crate::state::ConversationState;
use crate::state::Delivery;
use crate::state::Escalation;
use crate::state::Mode;
use crate::state::Role;
use crate::view::ConversationView;
use crate::view::EscalationControl;
use crate::view::Notification;

const NO_CONVERSATION_SELECTED: &str = "No conversation selected.";
const NO_COURSE_SELECTED: &str = "No course selected, so a new conversation cannot be started.";
const HISTORY_LOAD_FAILED: &str = "Error loading conversation history.";
const CONVERSATION_NOT_FOUND: &str = "This conversation could not be found.";
const SIDEBAR_LOAD_FAILED: &str = "Could not load your conversations.";
const REDIRECT_FAILED: &str = "Failed to redirect to an assistant. Please try again.";
const RESOLVE_FAILED: &str = "Failed to mark as resolved. Please try again.";
const REDIRECTED_NOTICE: &str =
    "Your conversation is now visible to assistants. The chatbot is disabled for this conversation.";
const RESOLVED_NOTICE: &str = "Conversation marked as resolved.";
const ASSISTANT_SEND_FAILED: &str = "Error sending message. Please try again.";
const CONFIRM_RESOLVE: &str =
    "Mark this conversation as resolved? The student will no longer get replies. Repeat to confirm.";

/// What the page was opened with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageContext {
    pub conversation_id: Option<ConversationId>,
    pub course_id: Option<CourseId>,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    pub poll_interval: Duration,
    pub notification_ttl: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            notification_ttl: DEFAULT_NOTIFICATION_TTL,
        }
    }
}

impl From<&Config> for ControllerOptions {
    fn from(config: &Config) -> Self {
        Self {
            poll_interval: config.poll_interval,
            notification_ttl: config.notification_ttl,
        }
    }
}

pub struct ViewController<V: ConversationView> {
    backend: Arc<dyn ChatBackend>,
    view: V,
    state: ConversationState,
    sidebar: SidebarRegistry,
    course_id: Option<CourseId>,
    options: ControllerOptions,
    poll_tx: mpsc::Sender<PollTick>,
    poller: Option<Poller>,
    role: Role,
    /// The assistant asked to resolve once; the next escalation click
    /// confirms.
    resolve_armed: bool,
}

impl<V: ConversationView> ViewController<V> {
    /// `poll_tx` is the sending half of the channel the owning event loop
    /// drains into [`Self::on_poll_tick`].
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        view: V,
        poll_tx: mpsc::Sender<PollTick>,
        options: ControllerOptions,
    ) -> Self {
        Self {
            backend,
            view,
            state: ConversationState::new_conversation(),
            sidebar: SidebarRegistry::new(),
            course_id: None,
            options,
            poll_tx,
            poller: None,
            role: Role::Student,
            resolve_armed: false,
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn sidebar(&self) -> &SidebarRegistry {
        &self.sidebar
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn course_id(&self) -> Option<CourseId> {
        self.course_id
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_some()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Set up the view for `page`: list the sidebar and, for an existing
    /// conversation, load its history and escalation status and start
    /// polling.
    pub async fn initialize(&mut self, page: PageContext) {
        self.stop_polling().await;
        self.course_id = page.course_id;
        self.role = page.role;
        self.resolve_armed = false;
        self.state = match page.conversation_id {
            Some(id) => ConversationState::existing(id),
            None => ConversationState::new_conversation(),
        };
        info!(
            "initializing {:?} {:?} view (conversation {:?}, course {:?})",
            self.role,
            self.state.mode(),
            page.conversation_id,
            page.course_id
        );
        self.view.clear_messages();
        self.publish_escalation_control();

        self.refresh_sidebar().await;
        match page.conversation_id {
            Some(id) => self.load_existing(id).await,
            // Assistants only ever open a conversation a student started.
            None if self.role == Role::Assistant => self.push_system(NO_CONVERSATION_SELECTED),
            None => {}
        }
    }

    /// Re-list the sidebar from the backend, scoped to the course when one is
    /// known and to the user otherwise.
    pub async fn refresh_sidebar(&mut self) {
        if self.role == Role::Assistant {
            debug!("assistant view has no sidebar");
            return;
        }
        let scope = match (self.course_id, self.state.conversation_id()) {
            (Some(course), _) => ListScope::Course(course),
            (None, Some(_)) => ListScope::User,
            (None, None) => {
                debug!("no course or conversation; skipping sidebar listing");
                return;
            }
        };
        match self.backend.list_conversations(scope).await {
            Ok(summaries) => {
                self.sidebar.rebuild_from(summaries);
                if let Some(id) = self.state.conversation_id() {
                    self.sidebar.mark_active(id);
                }
                self.view.render_sidebar(self.sidebar.entries());
            }
            Err(e) => {
                warn!("failed to list conversations: {e}");
                self.push_system(SIDEBAR_LOAD_FAILED);
            }
        }
    }

    /// Send what the user typed. Empty input is ignored.
    pub async fn handle_submit(&mut self, raw: &str) {
        let text = raw.trim();
        if text.is_empty() {
            return;
        }
        self.disarm_resolve();
        if self.role == Role::Assistant {
            self.submit_as_assistant(text).await;
            return;
        }

        let student = Message::student(text);
        let index = self.state.store_mut().push_pending(student.clone());
        self.view.append_message(&student);
        self.view.clear_input();

        let sent = match self.state.conversation_id() {
            Some(id) => match self.backend.send_message(id, text).await {
                Ok(()) => Some(id),
                Err(e) => {
                    self.report_failure("send message", &e);
                    None
                }
            },
            None => self.create_conversation(text).await,
        };

        let Some(id) = sent else {
            self.state.store_mut().mark(index, Delivery::Failed);
            return;
        };
        self.state.store_mut().mark(index, Delivery::Delivered);
        self.request_reply(id, text).await;
    }

    /// Store an assistant message. Assistants answer in place of the bot, so
    /// no reply is requested.
    async fn submit_as_assistant(&mut self, text: &str) {
        let Some(id) = self.state.conversation_id() else {
            self.push_system(NO_CONVERSATION_SELECTED);
            return;
        };
        let message = Message::assistant(text);
        let index = self.state.store_mut().push_pending(message.clone());
        self.view.append_message(&message);
        self.view.clear_input();

        match self.backend.send_assistant_message(id, text).await {
            Ok(()) => self.state.store_mut().mark(index, Delivery::Delivered),
            Err(e) => {
                warn!("send assistant message to conversation {id} failed: {e}");
                self.state.store_mut().mark(index, Delivery::Failed);
                self.push_system(ASSISTANT_SEND_FAILED);
            }
        }
    }

    async fn create_conversation(&mut self, text: &str) -> Option<ConversationId> {
        let Some(course) = self.course_id else {
            warn!("cannot create a conversation without a course id");
            self.push_system(NO_COURSE_SELECTED);
            return None;
        };
        let created = match self.backend.create_conversation(course, text).await {
            Ok(created) => created,
            Err(e) => {
                self.report_failure("create conversation", &e);
                return None;
            }
        };

        let id = created.id;
        info!("created conversation {id} in course {course}");
        self.state.bind(id);
        self.view.replace_path(&conversation_path(id));
        let summary = ConversationSummary::new(id, created.title.as_deref());
        self.sidebar.upsert(id, summary.label);
        self.sidebar.mark_active(id);
        self.view.render_sidebar(self.sidebar.entries());
        self.start_polling(id);
        Some(id)
    }

    async fn request_reply(&mut self, id: ConversationId, text: &str) {
        match self.backend.get_reply(id, text).await {
            Ok(reply) => {
                let message = Message::bot(reply);
                self.state.store_mut().push_delivered(message.clone());
                self.view.append_message(&message);
            }
            Err(e) => {
                self.report_failure("get reply", &e);
            }
        }
    }

    /// Advance the escalation control. Students redirect to an assistant,
    /// then mark resolved; assistants can only resolve, and must click twice.
    /// Once resolved, clicks do nothing.
    pub async fn handle_escalation_click(&mut self) {
        let Some(id) = self.state.conversation_id() else {
            self.push_system(NO_CONVERSATION_SELECTED);
            return;
        };

        if self.role == Role::Assistant {
            self.resolve_as_assistant(id).await;
            return;
        }
        match self.state.escalation() {
            Escalation::Normal => match self.backend.redirect(id).await {
                Ok(()) => {
                    info!("conversation {id} redirected to an assistant");
                    self.advance_escalation(Escalation::RedirectedToAssistant);
                    self.push_system(REDIRECTED_NOTICE);
                }
                Err(e) => self.report_escalation_failure("redirect", &e, REDIRECT_FAILED),
            },
            Escalation::RedirectedToAssistant => match self.backend.resolve(id).await {
                Ok(()) => {
                    info!("conversation {id} resolved");
                    self.advance_escalation(Escalation::Resolved);
                    self.push_system(RESOLVED_NOTICE);
                }
                Err(e) => self.report_escalation_failure("resolve", &e, RESOLVE_FAILED),
            },
            Escalation::Resolved => {
                debug!("conversation {id} already resolved; ignoring escalation click");
            }
        }
    }

    async fn resolve_as_assistant(&mut self, id: ConversationId) {
        if self.state.escalation() == Escalation::Resolved {
            debug!("conversation {id} already resolved; ignoring escalation click");
            return;
        }
        if !self.resolve_armed {
            self.resolve_armed = true;
            self.push_system(CONFIRM_RESOLVE);
            self.publish_escalation_control();
            return;
        }

        self.resolve_armed = false;
        match self.backend.resolve(id).await {
            Ok(()) => {
                info!("conversation {id} resolved by an assistant");
                self.advance_escalation(Escalation::Resolved);
                self.push_system(RESOLVED_NOTICE);
            }
            Err(e) => self.report_escalation_failure("resolve", &e, RESOLVE_FAILED),
        }
        self.publish_escalation_control();
    }

    /// Switch to another conversation from the sidebar. Selecting the
    /// conversation already shown reloads it from the server and keeps
    /// messages the server has not acknowledged.
    pub async fn select_conversation(&mut self, id: ConversationId) {
        self.stop_polling().await;
        self.disarm_resolve();
        if self.state.conversation_id() != Some(id) {
            self.state = ConversationState::existing(id);
        }
        self.view.replace_path(&conversation_path(id));
        self.view.clear_messages();
        if self.role == Role::Student {
            self.sidebar.mark_active(id);
            self.view.render_sidebar(self.sidebar.entries());
        }
        self.publish_escalation_control();
        self.load_existing(id).await;
    }

    pub async fn on_poll_tick(&mut self, tick: PollTick) {
        if self.state.conversation_id() != Some(tick.conversation_id) {
            trace!(
                "ignoring poll tick for conversation {} that is no longer shown",
                tick.conversation_id
            );
            return;
        }
        self.poll().await;
    }

    /// Fetch the active conversation and render whatever the server holds
    /// beyond the delivered count. Returns the number of new messages.
    pub async fn poll(&mut self) -> usize {
        if self.state.mode() != Mode::Existing {
            return 0;
        }
        let Some(id) = self.state.conversation_id() else {
            return 0;
        };
        let messages = match self.backend.load_conversation(id).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!("poll of conversation {id} failed: {e}");
                return 0;
            }
        };

        let fresh = self.state.store_mut().apply_poll(messages);
        for message in &fresh {
            self.view.append_message(message);
        }
        let ttl = self.options.notification_ttl;
        match self.role {
            Role::Student if fresh.iter().any(|m| m.sender == Sender::Assistant) => {
                self.view.notify(Notification::assistant_replied(ttl));
            }
            Role::Assistant if fresh.iter().any(|m| m.sender == Sender::Student) => {
                self.view.notify(Notification::student_replied(ttl));
            }
            _ => {}
        }
        if !fresh.is_empty() {
            debug!("poll of conversation {id} found {} new messages", fresh.len());
        }
        fresh.len()
    }

    /// Release the polling timer. The view stays as it is.
    pub async fn teardown(&mut self) {
        self.stop_polling().await;
    }

    async fn load_existing(&mut self, id: ConversationId) {
        match self.backend.load_conversation(id).await {
            Ok(messages) => {
                self.state.store_mut().hydrate(messages);
                self.redraw_messages();
            }
            Err(e) => {
                warn!("failed to load conversation {id}: {e}");
                let notice = if is_not_found(&e) {
                    CONVERSATION_NOT_FOUND
                } else {
                    HISTORY_LOAD_FAILED
                };
                self.push_system(notice);
                return;
            }
        }

        match self.backend.escalation_status(id).await {
            Ok(status) => {
                if let Some(target) = Escalation::from_redirect_status(status) {
                    self.advance_escalation(target);
                }
            }
            Err(e) => debug!("escalation status of conversation {id} unavailable: {e}"),
        }

        self.start_polling(id);
    }

    fn redraw_messages(&mut self) {
        self.view.clear_messages();
        for message in self.state.store().messages() {
            self.view.append_message(message);
        }
    }

    fn start_polling(&mut self, id: ConversationId) {
        if self
            .poller
            .as_ref()
            .is_some_and(|poller| poller.conversation_id() == id)
        {
            return;
        }
        debug!(
            "polling conversation {id} every {:?}",
            self.options.poll_interval
        );
        self.poller = Some(Poller::spawn(
            id,
            self.options.poll_interval,
            self.poll_tx.clone(),
        ));
    }

    async fn stop_polling(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop().await;
        }
    }

    fn advance_escalation(&mut self, target: Escalation) {
        if self.state.advance_escalation(target) {
            self.publish_escalation_control();
        }
    }

    fn publish_escalation_control(&mut self) {
        let escalation = self.state.escalation();
        let control = match self.role {
            Role::Student => EscalationControl::for_state(escalation),
            Role::Assistant => EscalationControl::for_assistant(escalation, self.resolve_armed),
        };
        self.view.set_escalation_control(control);
    }

    fn disarm_resolve(&mut self) {
        if self.resolve_armed {
            self.resolve_armed = false;
            self.publish_escalation_control();
        }
    }

    fn push_system(&mut self, text: &str) {
        let message = Message::system(text);
        self.state.store_mut().push_local(message.clone());
        self.view.append_message(&message);
    }

    /// Translate a failed request into one System message plus the state
    /// transition its classification calls for.
    ///
    /// The backend refuses replies to resolved conversations the same way it
    /// refuses redirected ones, so a redirect refusal on a resolved
    /// conversation is reported as resolved.
    fn report_failure(&mut self, action: &str, err: &ChatErr) {
        let failure = match err.classify() {
            Failure::ConversationRedirected
                if self.state.escalation() == Escalation::Resolved =>
            {
                Failure::ConversationResolved
            }
            failure => failure,
        };
        warn!("{action} failed ({failure:?}): {err}");
        match failure {
            Failure::ConversationRedirected => {
                self.advance_escalation(Escalation::RedirectedToAssistant);
            }
            Failure::ConversationResolved => self.advance_escalation(Escalation::Resolved),
            Failure::TransportFailure => {}
        }
        self.push_system(failure.user_message());
    }

    fn report_escalation_failure(&mut self, action: &str, err: &ChatErr, fallback: &str) {
        match err.classify() {
            Failure::TransportFailure => {
                warn!("{action} failed: {err}");
                self.push_system(fallback);
            }
            Failure::ConversationRedirected | Failure::ConversationResolved => {
                self.report_failure(action, err);
            }
        }
    }
}
