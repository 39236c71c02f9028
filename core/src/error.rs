use reqwest::StatusCode;
use scotty_protocol::responses::ErrorBody;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChatErr>;

#[derive(Error, Debug)]
pub enum ChatErr {
    /// The backend refused to reply because a human assistant owns the
    /// conversation now.
    #[error("conversation has been redirected to an assistant")]
    ConversationRedirected,

    /// The backend refused the request because the conversation is closed.
    #[error("conversation has been resolved")]
    ConversationResolved,

    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },

    /// A 2xx response whose body carried an `error` field.
    #[error("backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),
}

/// How a failure is surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    ConversationRedirected,
    ConversationResolved,
    TransportFailure,
}

impl Failure {
    /// Text of the System message shown for this failure.
    pub fn user_message(self) -> &'static str {
        match self {
            Failure::ConversationRedirected => {
                "This conversation has been redirected to an assistant. The chatbot will not reply; an assistant will answer here."
            }
            Failure::ConversationResolved => {
                "This conversation has been resolved. No further replies will be sent."
            }
            Failure::TransportFailure => {
                "Could not reach the server. Please check your connection and try again."
            }
        }
    }
}

impl ChatErr {
    pub fn classify(&self) -> Failure {
        match self {
            ChatErr::ConversationRedirected => Failure::ConversationRedirected,
            ChatErr::ConversationResolved => Failure::ConversationResolved,
            ChatErr::UnexpectedStatus { .. }
            | ChatErr::Backend(_)
            | ChatErr::Reqwest(_)
            | ChatErr::Json(_)
            | ChatErr::Url(_) => Failure::TransportFailure,
        }
    }

    /// Interpret a failure body. Bodies naming a redirected or resolved
    /// conversation map to the matching classified error; anything else is a
    /// transport failure carrying the HTTP status when there is one.
    pub(crate) fn from_error_body(status: Option<StatusCode>, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let reason = parsed
            .status
            .iter()
            .chain(parsed.error.iter())
            .map(|s| s.to_ascii_lowercase())
            .collect::<Vec<_>>()
            .join(" ");

        if reason.contains("redirected") {
            return ChatErr::ConversationRedirected;
        }
        if reason.contains("resolved") || reason.contains("closed") {
            return ChatErr::ConversationResolved;
        }
        match (status, parsed.error) {
            (Some(status), _) => ChatErr::UnexpectedStatus {
                status,
                body: body.to_string(),
            },
            (None, Some(error)) => ChatErr::Backend(error),
            (None, None) => ChatErr::Backend(body.to_string()),
        }
    }
}
