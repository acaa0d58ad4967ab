use std::fmt;

use thiserror::Error;

pub type ChannelId = u64;
pub type QueryId = u64;

/// Close code reported when a close frame carried no status.
pub const CLOSE_NO_STATUS: u16 = 1005;
/// Close code reported when the connection ended without a close frame.
pub const CLOSE_ABNORMAL: u16 = 1006;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseReport {
    pub was_clean: bool,
    pub code: u16,
    pub reason: String,
}

impl CloseReport {
    pub fn abnormal(reason: impl Into<String>) -> Self {
        Self {
            was_clean: false,
            code: CLOSE_ABNORMAL,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    ChannelOpened {
        channel: ChannelId,
    },
    ChannelMessage {
        channel: ChannelId,
        payload: Vec<u8>,
    },
    ChannelClosed {
        channel: ChannelId,
        report: CloseReport,
    },
    LookupCompleted {
        query: QueryId,
        branch: usize,
        result: Result<bool, LookupError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct LookupError {
    pub kind: LookupFailureKind,
    pub message: String,
}

impl LookupError {
    pub(crate) fn new(kind: LookupFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupFailureKind {
    /// The pull request does not exist or has no merge commit.
    NotFound,
    InvalidRequest,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
}

impl fmt::Display for LookupFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupFailureKind::NotFound => write!(f, "not found"),
            LookupFailureKind::InvalidRequest => write!(f, "invalid request"),
            LookupFailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            LookupFailureKind::Timeout => write!(f, "timeout"),
            LookupFailureKind::Network => write!(f, "network error"),
            LookupFailureKind::Decode => write!(f, "unexpected response body"),
        }
    }
}
