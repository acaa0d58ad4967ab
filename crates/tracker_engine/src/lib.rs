//! Tracker engine: status-channel and branch-lookup I/O, driven by commands.
mod channel;
mod engine;
mod lookup;
mod sink;
mod types;

pub use channel::ChannelSettings;
pub use engine::{EngineHandle, EngineSettings};
pub use lookup::{BranchLookup, CompareStatus, GithubLookup, LookupSettings};
pub use sink::EventSink;
pub use types::{
    ChannelId, CloseReport, EngineEvent, LookupError, LookupFailureKind, QueryId,
    CLOSE_ABNORMAL, CLOSE_NO_STATUS,
};
