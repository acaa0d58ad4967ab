use crate::{BranchIndex, ChannelId, QueryId};

/// Close code for a normal closure.
pub const CLOSE_NORMAL: u16 = 1000;
/// Close code reported when the close frame carried no status.
pub const CLOSE_NO_STATUS: u16 = 1005;
/// Close code reported when the connection dropped without a close frame.
pub const CLOSE_ABNORMAL: u16 = 1006;

/// How a status channel ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInfo {
    pub was_clean: bool,
    pub code: u16,
    pub reason: String,
}

impl CloseInfo {
    pub fn clean(code: u16, reason: impl Into<String>) -> Self {
        Self {
            was_clean: true,
            code,
            reason: reason.into(),
        }
    }

    pub fn abnormal(reason: impl Into<String>) -> Self {
        Self {
            was_clean: false,
            code: CLOSE_ABNORMAL,
            reason: reason.into(),
        }
    }

    /// Only clean closes with an explicit, non-normal status carry a message
    /// meant for the user.
    pub fn reports_error(&self) -> bool {
        self.was_clean && self.code != CLOSE_NORMAL && self.code != CLOSE_NO_STATUS
    }
}

/// Classification of a failed branch lookup, as far as the UI cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupFailure {
    /// The identifier does not resolve to a merged item upstream.
    NotFound,
    /// Anything else; logged by the platform, invisible to the user.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the identifier input.
    InputChanged(String),
    /// User submitted the current input.
    QuerySubmitted,
    /// The status channel finished its handshake.
    ChannelOpened { channel: ChannelId },
    /// A binary result vector arrived on the status channel.
    ChannelMessage {
        channel: ChannelId,
        payload: Vec<u8>,
    },
    /// The status channel closed, cleanly or not.
    ChannelClosed {
        channel: ChannelId,
        close: CloseInfo,
    },
    /// One branch lookup settled.
    BranchResolved {
        query: QueryId,
        branch: BranchIndex,
        outcome: Result<bool, LookupFailure>,
    },
    /// The platform gave up waiting for a query.
    QueryTimedOut { query: QueryId },
}
