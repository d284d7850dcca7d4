//! Replay session: re-emit a tape with its original timing.
//!
//! Replay reconstructs inter-event delays from capture timestamps, scales
//! them by the speed multiplier, and drives an [`InputSink`]. Cancellation
//! is cooperative: the flag is checked at the top of each repetition and
//! before each event, never mid-wait, so timing windows stay tight.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use tapedeck_core::{clock, Error, Result, TimedEvent};

use crate::sink::InputSink;

/// Default pause between repetitions, in seconds.
pub const DEFAULT_RUN_PAUSE_SECS: f64 = 0.5;

/// Replay parameters.
#[derive(Clone, Debug)]
pub struct ReplayOptions {
    /// How many times the whole tape is replayed.
    pub repetitions: u32,
    /// Scale factor applied to inter-event delays (>1 = faster).
    pub speed: f64,
    /// Pause inserted between repetitions (not after the last), seconds.
    pub pause_between_runs: f64,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            repetitions: 1,
            speed: 1.0,
            pause_between_runs: DEFAULT_RUN_PAUSE_SECS,
        }
    }
}

impl ReplayOptions {
    pub fn with_repetitions(mut self, repetitions: u32) -> Self {
        self.repetitions = repetitions;
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_pause_between_runs(mut self, seconds: f64) -> Self {
        self.pause_between_runs = seconds;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.speed > 0.0) || !self.speed.is_finite() {
            return Err(Error::InvalidSpeed(self.speed));
        }
        if self.repetitions < 1 {
            return Err(Error::InvalidRepetitions(self.repetitions));
        }
        Ok(())
    }
}

/// Replay `events` against `sink`, observing `cancel` between events.
///
/// Blocks the calling thread for the full replay duration; the session
/// controller runs this on a dedicated worker thread. Returns `true` on
/// natural completion, `false` when cancelled. The caller guarantees
/// `events` is non-empty and validated options.
pub(crate) fn run(
    events: &[TimedEvent],
    options: &ReplayOptions,
    sink: &mut dyn InputSink,
    cancel: &AtomicBool,
) -> bool {
    let base = events[0].time();

    for rep in 0..options.repetitions {
        if cancel.load(Ordering::Acquire) {
            debug!(rep, "replay cancelled before repetition");
            return false;
        }

        let mut previous_offset = 0.0;
        for event in events {
            if cancel.load(Ordering::Acquire) {
                debug!(rep, "replay cancelled mid-repetition");
                return false;
            }

            let current_offset = event.time() - base;
            let delay = (current_offset - previous_offset) / options.speed;
            if delay > 0.0 {
                clock::precise_wait(delay);
            }
            previous_offset = current_offset;

            emit(event, sink);
        }

        if rep + 1 < options.repetitions {
            if cancel.load(Ordering::Acquire) {
                return false;
            }
            clock::precise_wait(options.pause_between_runs);
        }
    }

    debug!(repetitions = options.repetitions, "replay completed");
    true
}

/// Emit one event; a sink failure skips that single emission.
fn emit(event: &TimedEvent, sink: &mut dyn InputSink) {
    let outcome = match *event {
        TimedEvent::MouseMove { x, y, .. } => sink.mouse_move(x, y),
        TimedEvent::MouseClick {
            x, y, button, pressed, ..
        } => sink
            .mouse_move(x, y)
            .and_then(|()| sink.mouse_button(button, pressed)),
        TimedEvent::Keyboard {
            ref key, pressed, ..
        } => sink.key(key, pressed),
    };
    if let Err(err) = outcome {
        warn!(error = %err, "sink could not emit event, skipping");
    }
}
