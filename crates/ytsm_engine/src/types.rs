use std::fmt;

use ytsm_core::{
    AjaxAction, ModalForm, Notification, PollOutcome, RawSubmitReply, TreeNode, VideoPage,
};

/// Raw HTTP reply, already size-checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpReply {
    /// Media type without parameters, lowercased: `"application/json"`.
    pub fn media_type(&self) -> Option<String> {
        self.content_type.as_deref().map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or(ct)
                .trim()
                .to_ascii_lowercase()
        })
    }
}

/// Results the engine reports back to the page.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    JobsPolled {
        seq: u64,
        outcome: PollOutcome,
    },
    TreeLoaded(Result<Vec<TreeNode>, RequestError>),
    ModalLoaded {
        token: u64,
        result: Result<ModalForm, RequestError>,
    },
    ModalReplied {
        token: u64,
        result: Result<RawSubmitReply, RequestError>,
    },
    ActionCompleted {
        action: AjaxAction,
        result: Result<RawSubmitReply, RequestError>,
    },
    NotificationsPolled {
        after_id: u64,
        result: Result<Vec<Notification>, RequestError>,
    },
    VideosLoaded {
        seq: u64,
        result: Result<VideoPage, RequestError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestError {
    pub kind: FailureKind,
    pub message: String,
}

impl RequestError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for RequestError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    InvalidSettings,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    /// Body arrived but could not be understood.
    Decode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::InvalidSettings => write!(f, "invalid http settings"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Decode => write!(f, "undecodable response"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
