use std::fmt;

use unbait_core::RequestStatus;

/// Lifecycle notifications published by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestEvent {
    StatusChanged {
        url: String,
        status: RequestStatus,
    },
    Finished {
        url: String,
        outcome: RequestOutcome,
    },
}

/// How one `resolve` call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Answer delivered to the source tab.
    Delivered,
    /// Error popup shown (or attempted) with this message.
    Errored(String),
    /// The page surface reported the popup as dismissed before the terminal update.
    Canceled,
    /// The source tab disappeared; nothing more was sent.
    SourceGone,
    /// Another request for the same URL was already in flight.
    Rejected,
}

impl RequestOutcome {
    pub fn status(&self) -> Option<RequestStatus> {
        match self {
            RequestOutcome::Delivered => Some(RequestStatus::Done),
            RequestOutcome::Errored(_) => Some(RequestStatus::Errored),
            RequestOutcome::Canceled => Some(RequestStatus::Canceled),
            RequestOutcome::SourceGone | RequestOutcome::Rejected => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
