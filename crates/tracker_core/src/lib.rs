//! Tracker core: pure query-session state machine and view-model helpers.
mod branch;
mod effect;
mod error;
mod msg;
mod state;
mod update;
mod view_model;

pub use branch::{BranchIndex, BranchTable, PrNumber, DEFAULT_BRANCHES};
pub use effect::Effect;
pub use error::SessionError;
pub use msg::{
    CloseInfo, LookupFailure, Msg, CLOSE_ABNORMAL, CLOSE_NORMAL, CLOSE_NO_STATUS,
};
pub use state::{AppState, ChannelId, ConnectionState, QueryId, SessionPhase, TransportKind};
pub use update::update;
pub use view_model::{AppViewModel, MarkerView};
