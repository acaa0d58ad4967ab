#![deny(missing_docs)]
//! Shared logging utilities for the tracker workspace.
//!
//! This crate provides the `tracker_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Log lines that belong
//! to a query carry its id through [`with_query`].

use std::cell::Cell;

thread_local! {
    /// Thread-local storage for the query currently being dispatched.
    static QUERY_ID: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Sets the query id reported by [`current_query`] on this thread.
/// The dispatch loop calls this before applying each message.
pub fn set_current_query(query_id: Option<u64>) {
    QUERY_ID.with(|v| v.set(query_id));
}

/// Retrieves the query id set for the current thread, if any.
pub fn current_query() -> Option<u64> {
    QUERY_ID.with(|v| v.get())
}

/// Formats a `q=<id>` tag for the current query, or `q=-` when idle.
pub fn with_query() -> String {
    match current_query() {
        Some(id) => format!("q={id}"),
        None => "q=-".to_string(),
    }
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! tracker_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! tracker_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! tracker_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! tracker_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! tracker_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Initializes a simple stderr logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Another test may already own the global logger.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Never,
    )]);
}
