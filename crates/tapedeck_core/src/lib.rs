//! Tapedeck Core
//!
//! This crate provides the foundational primitives for the Tapedeck input
//! macro engine:
//!
//! - **Timed Events**: Immutable input occurrences stamped with a monotonic
//!   timestamp, collected into ordered tapes
//! - **Monotonic Timing**: A process-wide monotonic clock and a precise
//!   waiter for sub-millisecond replay delays
//! - **Tape Persistence**: JSON tape files that round-trip relative timings
//!   and event content exactly
//!
//! # Example
//!
//! ```rust
//! use tapedeck_core::{clock, EventSequence, TimedEvent};
//!
//! let mut tape = EventSequence::new();
//! tape.push(TimedEvent::MouseMove { time: clock::now(), x: 10, y: 20 });
//!
//! assert_eq!(tape.len(), 1);
//! assert!(!tape.is_empty());
//! ```

pub mod clock;
pub mod error;
pub mod event;
pub mod sequence;
pub mod store;

pub use error::{Error, Result};
pub use event::{KeyId, MouseButton, NamedKey, TimedEvent};
pub use sequence::EventSequence;
pub use store::EventRecord;
