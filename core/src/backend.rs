//! Transport to the chatbot web backend.
//!
//! Every capability the conversation view needs is one method on
//! [`ChatBackend`]. Methods never retry; failures come back as [`ChatErr`] so
//! the caller decides what the user sees.

use async_trait::async_trait;
use reqwest::StatusCode;
use scotty_protocol::models::ConversationId;
use scotty_protocol::models::ConversationSummary;
use scotty_protocol::models::CourseId;
use scotty_protocol::models::Message;
use scotty_protocol::requests::ConversationRequest;
use scotty_protocol::responses::CreateConversationResponse;
use scotty_protocol::responses::ListingEntry;
use scotty_protocol::responses::LoadConversationResponse;
use scotty_protocol::responses::RedirectStatus;
use scotty_protocol::responses::RedirectStatusResponse;
use scotty_protocol::responses::ReplyResponse;
use scotty_protocol::responses::StatusResponse;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::default_client::create_client;
use crate::error::ChatErr;
use crate::error::Result;

/// Which conversations the sidebar lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    Course(CourseId),
    /// Every conversation of the signed-in user.
    User,
}

impl ListScope {
    fn course_segment(self) -> i64 {
        match self {
            ListScope::Course(course) => course.0,
            // The backend treats course 0 as "all of the user's courses".
            ListScope::User => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedConversation {
    pub id: ConversationId,
    pub title: Option<String>,
}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Conversations in the order the backend reports them (creation order).
    async fn list_conversations(&self, scope: ListScope) -> Result<Vec<ConversationSummary>>;

    async fn load_conversation(&self, id: ConversationId) -> Result<Vec<Message>>;

    /// Create a conversation. The backend stores `message` as its first
    /// student message.
    async fn create_conversation(
        &self,
        course: CourseId,
        message: &str,
    ) -> Result<CreatedConversation>;

    async fn send_message(&self, id: ConversationId, message: &str) -> Result<()>;

    /// Ask the bot to answer `message`, returning the reply text.
    async fn get_reply(&self, id: ConversationId, message: &str) -> Result<String>;

    async fn redirect(&self, id: ConversationId) -> Result<()>;

    async fn resolve(&self, id: ConversationId) -> Result<()>;

    async fn escalation_status(&self, id: ConversationId) -> Result<RedirectStatus>;

    /// Store a message written by an assistant. No reply is requested.
    async fn send_assistant_message(&self, id: ConversationId, message: &str) -> Result<()>;
}

/// [`ChatBackend`] over the backend's JSON-over-HTTP endpoints.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Self {
        Self::with_client(
            create_client(&config.originator, config.request_timeout),
            config.base_url.clone(),
        )
    }

    pub fn with_client(client: reqwest::Client, mut base_url: Url) -> Self {
        // `Url::join` drops the last path segment unless it ends with '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { client, base_url }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn post_raw(&self, path: &str, request: &ConversationRequest) -> Result<String> {
        let url = self.endpoint(path)?;
        debug!("POST {url} {request:?}");
        let response = self.client.post(url).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            debug!("POST {path} failed with {status}: {body}");
            return Err(ChatErr::from_error_body(Some(status), &body));
        }
        // Some endpoints answer unknown request types with 200 + {"error": ...}.
        if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(&body)
            && map.contains_key("error")
        {
            return Err(ChatErr::from_error_body(None, &body));
        }
        Ok(body)
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        request: &ConversationRequest,
    ) -> Result<T> {
        let body = self.post_raw(path, request).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn new_chat_path(course: i64) -> String {
    format!("conversation/new/{course}/chat")
}

fn conversation_path(id: ConversationId) -> String {
    format!("conversation/{id}")
}

fn assistant_send_path(id: ConversationId) -> String {
    format!("assistant/conversation/{id}/send")
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn list_conversations(&self, scope: ListScope) -> Result<Vec<ConversationSummary>> {
        let entries: Vec<ListingEntry> = self
            .post(
                &new_chat_path(scope.course_segment()),
                &ConversationRequest::Ids,
            )
            .await?;
        Ok(entries
            .into_iter()
            .map(ListingEntry::into_summary)
            .collect())
    }

    async fn load_conversation(&self, id: ConversationId) -> Result<Vec<Message>> {
        let response: LoadConversationResponse = self
            .post(&conversation_path(id), &ConversationRequest::Conversation)
            .await?;
        Ok(response.messages.into_iter().map(Message::from).collect())
    }

    async fn create_conversation(
        &self,
        course: CourseId,
        message: &str,
    ) -> Result<CreatedConversation> {
        let response: CreateConversationResponse = self
            .post(
                &new_chat_path(course.0),
                &ConversationRequest::Create {
                    message: message.to_string(),
                },
            )
            .await?;
        Ok(CreatedConversation {
            id: response.conversation_id,
            title: response.title,
        })
    }

    async fn send_message(&self, id: ConversationId, message: &str) -> Result<()> {
        self.post_raw(
            &conversation_path(id),
            &ConversationRequest::Send {
                message: message.to_string(),
            },
        )
        .await?;
        Ok(())
    }

    async fn get_reply(&self, id: ConversationId, message: &str) -> Result<String> {
        let response: ReplyResponse = self
            .post(
                &conversation_path(id),
                &ConversationRequest::Reply {
                    message: message.to_string(),
                },
            )
            .await?;
        // The backend answers redirected conversations with an empty reply.
        if response.reply.is_empty() {
            return Err(ChatErr::ConversationRedirected);
        }
        Ok(response.reply)
    }

    async fn redirect(&self, id: ConversationId) -> Result<()> {
        let response: StatusResponse = self
            .post(
                &format!("{}/redirect", conversation_path(id)),
                &ConversationRequest::Redirect,
            )
            .await?;
        match response.status.as_str() {
            "redirected" => Ok(()),
            "resolved" => Err(ChatErr::ConversationResolved),
            other => Err(ChatErr::Backend(format!(
                "unexpected redirect status {other:?}"
            ))),
        }
    }

    async fn resolve(&self, id: ConversationId) -> Result<()> {
        let response: StatusResponse = self
            .post(
                &format!("{}/resolve", conversation_path(id)),
                &ConversationRequest::Resolve,
            )
            .await?;
        match response.status.as_str() {
            "resolved" => Ok(()),
            other => Err(ChatErr::Backend(format!(
                "unexpected resolve status {other:?}"
            ))),
        }
    }

    async fn escalation_status(&self, id: ConversationId) -> Result<RedirectStatus> {
        let response: RedirectStatusResponse = self
            .post(&conversation_path(id), &ConversationRequest::Redirect)
            .await?;
        Ok(response.status())
    }

    async fn send_assistant_message(&self, id: ConversationId, message: &str) -> Result<()> {
        let response: StatusResponse = self
            .post(
                &assistant_send_path(id),
                &ConversationRequest::AssistantMessage {
                    message: message.to_string(),
                },
            )
            .await?;
        match response.status.as_str() {
            "sent" => Ok(()),
            other => Err(ChatErr::Backend(format!(
                "unexpected assistant send status {other:?}"
            ))),
        }
    }
}

/// True when `err` is an HTTP 404 from the backend.
pub fn is_not_found(err: &ChatErr) -> bool {
    matches!(
        err,
        ChatErr::UnexpectedStatus {
            status: StatusCode::NOT_FOUND,
            ..
        }
    )
}
