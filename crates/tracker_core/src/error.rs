use thiserror::Error;

/// User-facing failures of a query session. `Display` is the text shown in
/// the error slot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Error: not a number")]
    InvalidInput,
    #[error("{}", describe_close(*code, reason))]
    ChannelClosed { code: u16, reason: String },
    #[error("Error: Unable to find the PR provided")]
    RemoteLookup,
    #[error("Error: timed out waiting for results")]
    TimedOut,
}

fn describe_close(code: u16, reason: &str) -> String {
    if reason.is_empty() {
        format!("Error: connection closed (code {code})")
    } else {
        reason.to_string()
    }
}
