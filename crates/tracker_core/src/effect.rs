use crate::{BranchIndex, ChannelId, PrNumber, QueryId};

/// Side effects requested by [`crate::update`]; executed by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open a fresh status channel. Its events must be tagged with `channel`.
    OpenChannel { channel: ChannelId },
    /// Send the identifier as a text frame over an open channel.
    SendQuery {
        channel: ChannelId,
        query: QueryId,
        pr: PrNumber,
    },
    /// Ask the lookup transport whether `pr` is present on one branch.
    LookupBranch {
        query: QueryId,
        pr: PrNumber,
        branch: BranchIndex,
        name: String,
    },
}
