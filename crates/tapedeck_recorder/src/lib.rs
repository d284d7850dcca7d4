//! Tapedeck recording and replay engine.
//!
//! This crate provides:
//! - `CaptureSession` - Convert a live input stream into a timed tape
//! - `ReplaySession` - Re-emit a tape with original timing, scaled by speed
//! - `MacroRecorder` - The session state machine gating both
//!
//! Raw input hooks and simulated input injection live behind the
//! [`InputSource`] and [`InputSink`] traits; the engine never talks to the
//! OS directly.
//!
//! # Example
//!
//! ```no_run
//! use tapedeck_recorder::{MacroRecorder, ReplayOptions, TraceSink};
//!
//! let recorder = MacroRecorder::new();
//! recorder.load_from("tape.json")?;
//!
//! let options = ReplayOptions::default().with_speed(2.0).with_repetitions(3);
//! recorder.start_replay(Box::new(TraceSink), options)?;
//! # Ok::<(), tapedeck_core::Error>(())
//! ```

pub mod capture;
pub mod controller;
pub mod replay;
pub mod sink;
pub mod testing;

pub use capture::{CaptureHandle, CaptureSession, InputSource, SourceSubscription};
pub use controller::{MacroRecorder, SessionState};
pub use replay::ReplayOptions;
pub use sink::{InputSink, TraceSink};
