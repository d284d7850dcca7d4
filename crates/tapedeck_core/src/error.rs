//! Error taxonomy for the Tapedeck engine.
//!
//! Recoverable degradations (an unrecognized key symbol in a tape, a sink
//! that cannot emit one event, an input source that fails to unsubscribe)
//! are logged and skipped rather than surfaced here; every variant below
//! aborts the requested operation without changing session state.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Replay was requested on a tape with no events.
    #[error("no recorded events to replay")]
    EmptySequence,

    /// The operation conflicts with a session that is currently active.
    #[error("operation unavailable while {active}")]
    SessionBusy {
        /// Label of the active session state.
        active: &'static str,
    },

    /// Replay speed must be strictly positive.
    #[error("speed multiplier must be positive, got {0}")]
    InvalidSpeed(f64),

    /// Replay repetition count must be at least one.
    #[error("repetition count must be at least 1, got {0}")]
    InvalidRepetitions(u32),

    /// A tape file could not be read or written.
    #[error("tape i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// A tape file does not contain a valid event array.
    #[error("tape format invalid: {0}")]
    Json(#[from] serde_json::Error),

    /// An input source failed to subscribe.
    #[error("input source failed: {0}")]
    Source(String),

    /// An output sink failed to emit a simulated event.
    #[error("input injection failed: {0}")]
    Injection(String),
}

pub type Result<T> = std::result::Result<T, Error>;
