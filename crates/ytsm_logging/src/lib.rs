#![deny(missing_docs)]
//! Shared logging utilities for the ytsm workspace.
//!
//! This crate provides the `ytsm_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Every line is
//! prefixed with the poll sequence number active on the logging thread, so
//! the interleaving of timer ticks, replies and reconciliation stays readable.

use std::cell::Cell;

thread_local! {
    /// Sequence number of the job poll currently being handled on this thread.
    static POLL_SEQ: Cell<u64> = const { Cell::new(0) };
}

/// Records the poll sequence number handled by the current thread.
pub fn set_poll_seq(seq: u64) {
    POLL_SEQ.with(|v| v.set(seq));
}

/// Returns the poll sequence number for the current thread, 0 before the first poll.
pub fn poll_seq() -> u64 {
    POLL_SEQ.with(|v| v.get())
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! ytsm_trace {
    ($($arg:tt)*) => {{
        log::trace!("[poll {}] {}", $crate::poll_seq(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! ytsm_info {
    ($($arg:tt)*) => {{
        log::info!("[poll {}] {}", $crate::poll_seq(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! ytsm_debug {
    ($($arg:tt)*) => {{
        log::debug!("[poll {}] {}", $crate::poll_seq(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! ytsm_warn {
    ($($arg:tt)*) => {{
        log::warn!("[poll {}] {}", $crate::poll_seq(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! ytsm_error {
    ($($arg:tt)*) => {{
        log::error!("[poll {}] {}", $crate::poll_seq(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Another test binary thread may have won the race.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_seq_is_thread_local() {
        set_poll_seq(7);
        assert_eq!(poll_seq(), 7);
        let other = std::thread::spawn(poll_seq).join().unwrap();
        assert_eq!(other, 0);
    }
}
