//! Session controller: the recording/replay state machine.
//!
//! Exactly one of `Idle`, `Recording`, `Replaying` holds at any time.
//! Starting one activity while the other is running is rejected, never
//! interleaved. Stopping a recording completes unsubscription before
//! returning, so a replay started afterwards always sees a stable tape.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use tracing::{debug, info};

use tapedeck_core::{store, Error, EventSequence, Result};

use crate::capture::{CaptureSession, InputSource};
use crate::replay::{self, ReplayOptions};
use crate::sink::InputSink;

/// Session activity. Labels feed the presentation-layer observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording,
    Replaying,
}

impl SessionState {
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Recording => "Recording",
            SessionState::Replaying => "Replaying",
        }
    }

    pub fn is_active(&self) -> bool {
        *self != SessionState::Idle
    }
}

/// Callback invoked on every state transition with `(active, label)`.
pub type StatusObserver = Box<dyn Fn(bool, &'static str) + Send + Sync>;

struct ControlState {
    state: SessionState,
    capture: Option<CaptureSession>,
    replay_cancel: Option<Arc<AtomicBool>>,
    /// Bumped per replay so a stale worker cannot clobber a newer session.
    generation: u64,
}

struct Inner {
    control: Mutex<ControlState>,
    sequence: Arc<Mutex<EventSequence>>,
    observer: Mutex<Option<StatusObserver>>,
}

impl Inner {
    fn notify(&self, state: SessionState) {
        if let Some(observer) = &*self.observer.lock() {
            observer(state.is_active(), state.label());
        }
    }
}

/// The macro recorder: owns the tape and gates capture and replay.
///
/// Cloning yields another handle to the same recorder; all methods are
/// synchronous and safe to call from any thread. Replay itself runs on a
/// dedicated worker thread so stop requests stay responsive.
#[derive(Clone)]
pub struct MacroRecorder {
    inner: Arc<Inner>,
}

impl MacroRecorder {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                control: Mutex::new(ControlState {
                    state: SessionState::Idle,
                    capture: None,
                    replay_cancel: None,
                    generation: 0,
                }),
                sequence: Arc::new(Mutex::new(EventSequence::new())),
                observer: Mutex::new(None),
            }),
        }
    }

    /// Register the presentation-layer observer.
    pub fn set_observer(&self, observer: impl Fn(bool, &'static str) + Send + Sync + 'static) {
        *self.inner.observer.lock() = Some(Box::new(observer));
    }

    pub fn state(&self) -> SessionState {
        self.inner.control.lock().state
    }

    pub fn sequence_len(&self) -> usize {
        self.inner.sequence.lock().len()
    }

    /// Copy of the current tape.
    pub fn snapshot(&self) -> EventSequence {
        self.inner.sequence.lock().clone()
    }

    /// Begin recording from `source`, clearing the previous tape.
    ///
    /// Rejected while recording or replaying.
    pub fn start_recording(&self, source: &mut dyn InputSource) -> Result<()> {
        let mut control = self.inner.control.lock();
        if control.state.is_active() {
            return Err(Error::SessionBusy {
                active: control.state.label(),
            });
        }

        let capture = CaptureSession::start(source, self.inner.sequence.clone())?;
        control.capture = Some(capture);
        control.state = SessionState::Recording;
        drop(control);

        self.inner.notify(SessionState::Recording);
        info!("recording started");
        Ok(())
    }

    /// Stop recording, retaining the captured tape.
    ///
    /// A no-op when idle; rejected while replaying. Unsubscription has
    /// completed by the time this returns.
    pub fn stop_recording(&self) -> Result<()> {
        let mut control = self.inner.control.lock();
        match control.state {
            SessionState::Replaying => Err(Error::SessionBusy {
                active: SessionState::Replaying.label(),
            }),
            SessionState::Idle => Ok(()),
            SessionState::Recording => {
                if let Some(mut capture) = control.capture.take() {
                    capture.stop();
                }
                control.state = SessionState::Idle;
                drop(control);

                self.inner.notify(SessionState::Idle);
                info!(events = self.sequence_len(), "recording stopped");
                Ok(())
            }
        }
    }

    /// Replay the current tape against `sink` on a worker thread.
    ///
    /// Rejected while recording or replaying, and for an empty tape.
    /// Natural completion transitions back to `Idle` without a stop call.
    pub fn start_replay(&self, sink: Box<dyn InputSink>, options: ReplayOptions) -> Result<()> {
        options.validate()?;

        let mut control = self.inner.control.lock();
        if control.state.is_active() {
            return Err(Error::SessionBusy {
                active: control.state.label(),
            });
        }

        let events = {
            let sequence = self.inner.sequence.lock();
            if sequence.is_empty() {
                return Err(Error::EmptySequence);
            }
            sequence.as_slice().to_vec()
        };

        control.generation += 1;
        let generation = control.generation;
        let cancel = Arc::new(AtomicBool::new(false));
        control.replay_cancel = Some(cancel.clone());
        control.state = SessionState::Replaying;

        let repetitions = options.repetitions;
        let speed = options.speed;
        let inner = self.inner.clone();
        let spawned = thread::Builder::new()
            .name("tapedeck-replay".into())
            .spawn(move || {
                let mut sink = sink;
                let completed = replay::run(&events, &options, sink.as_mut(), &cancel);
                finish_replay(&inner, generation, completed);
            });

        if let Err(err) = spawned {
            control.state = SessionState::Idle;
            control.replay_cancel = None;
            return Err(Error::Io(err));
        }
        drop(control);

        self.inner.notify(SessionState::Replaying);
        info!(repetitions, speed, "replay started");
        Ok(())
    }

    /// Request cancellation of the running replay.
    ///
    /// The worker observes the flag at the next event boundary; the state
    /// machine transitions to `Idle` immediately. A no-op when idle;
    /// rejected while recording.
    pub fn stop_replay(&self) -> Result<()> {
        let mut control = self.inner.control.lock();
        match control.state {
            SessionState::Recording => Err(Error::SessionBusy {
                active: SessionState::Recording.label(),
            }),
            SessionState::Idle => Ok(()),
            SessionState::Replaying => {
                if let Some(cancel) = control.replay_cancel.take() {
                    cancel.store(true, Ordering::Release);
                }
                control.state = SessionState::Idle;
                drop(control);

                self.inner.notify(SessionState::Idle);
                info!("replay stop requested");
                Ok(())
            }
        }
    }

    /// Hotkey-style toggle: start recording if idle, stop if recording.
    ///
    /// Returns the new activity flag and the label for the trigger control.
    pub fn toggle_recording(
        &self,
        source: &mut dyn InputSource,
    ) -> Result<(bool, &'static str)> {
        if self.state() == SessionState::Recording {
            self.stop_recording()?;
            Ok((false, "Start Recording"))
        } else {
            self.start_recording(source)?;
            Ok((true, "Stop Recording"))
        }
    }

    /// Hotkey-style toggle: start replay if idle, stop if replaying.
    pub fn toggle_replay(
        &self,
        sink: Box<dyn InputSink>,
        options: ReplayOptions,
    ) -> Result<(bool, &'static str)> {
        if self.state() == SessionState::Replaying {
            self.stop_replay()?;
            Ok((false, "Start Replay"))
        } else {
            self.start_replay(sink, options)?;
            Ok((true, "Stop Replay"))
        }
    }

    /// Save the current tape. Rejected while a session is active.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let control = self.inner.control.lock();
        if control.state.is_active() {
            return Err(Error::SessionBusy {
                active: control.state.label(),
            });
        }
        let sequence = self.inner.sequence.lock();
        store::save(path, &sequence)
    }

    /// Load a tape, replacing the current one wholesale.
    ///
    /// Rejected while a session is active; on failure the current tape is
    /// left untouched.
    pub fn load_from<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let control = self.inner.control.lock();
        if control.state.is_active() {
            return Err(Error::SessionBusy {
                active: control.state.label(),
            });
        }
        let loaded = store::load(path)?;
        *self.inner.sequence.lock() = loaded;
        Ok(())
    }
}

impl Default for MacroRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// Worker-side completion hook. Only the generation that started the
/// replay may transition the state machine; a stale worker finishing after
/// an explicit stop (or after a newer session began) is ignored.
fn finish_replay(inner: &Arc<Inner>, generation: u64, completed: bool) {
    let mut control = inner.control.lock();
    if control.state == SessionState::Replaying && control.generation == generation {
        control.state = SessionState::Idle;
        control.replay_cancel = None;
        drop(control);

        inner.notify(SessionState::Idle);
        debug!(completed, "replay worker finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CollectingSink, Emission, ManualSource};
    use std::time::{Duration, Instant};
    use tapedeck_core::{KeyId, MouseButton, TimedEvent};

    fn wait_for_idle(recorder: &MacroRecorder, timeout_ms: u64) -> bool {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        while Instant::now() < deadline {
            if recorder.state() == SessionState::Idle {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        recorder.state() == SessionState::Idle
    }

    fn recorder_with_tape(gap_ms: u64, count: usize) -> MacroRecorder {
        let recorder = MacroRecorder::new();
        let mut source = ManualSource::new();
        recorder.start_recording(&mut source).unwrap();
        let handle = source.handle().unwrap();
        for i in 0..count {
            handle.mouse_moved(i as i32, i as i32);
            if i + 1 < count {
                thread::sleep(Duration::from_millis(gap_ms));
            }
        }
        recorder.stop_recording().unwrap();
        recorder
    }

    #[test]
    fn test_record_then_replay() {
        let recorder = recorder_with_tape(5, 3);
        assert_eq!(recorder.sequence_len(), 3);
        assert_eq!(recorder.state(), SessionState::Idle);

        let (sink, log) = CollectingSink::new();
        recorder
            .start_replay(Box::new(sink), ReplayOptions::default())
            .unwrap();
        assert!(wait_for_idle(&recorder, 2_000));

        let emissions = log.snapshot();
        assert_eq!(emissions.len(), 3);
        assert_eq!(emissions[0].1, Emission::MouseMove { x: 0, y: 0 });
        assert_eq!(emissions[2].1, Emission::MouseMove { x: 2, y: 2 });
    }

    #[test]
    fn test_empty_tape_replay_is_rejected() {
        let recorder = MacroRecorder::new();
        let (sink, log) = CollectingSink::new();

        let err = recorder
            .start_replay(Box::new(sink), ReplayOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::EmptySequence));
        assert_eq!(recorder.state(), SessionState::Idle);
        assert!(log.is_empty());
    }

    #[test]
    fn test_start_recording_while_replaying_is_rejected() {
        let recorder = recorder_with_tape(150, 2);
        let (sink, _log) = CollectingSink::new();
        recorder
            .start_replay(Box::new(sink), ReplayOptions::default())
            .unwrap();
        assert_eq!(recorder.state(), SessionState::Replaying);

        let mut source = ManualSource::new();
        let err = recorder.start_recording(&mut source).unwrap_err();
        assert!(matches!(err, Error::SessionBusy { active: "Replaying" }));
        assert_eq!(recorder.state(), SessionState::Replaying);

        recorder.stop_replay().unwrap();
        assert!(wait_for_idle(&recorder, 1_000));
    }

    #[test]
    fn test_start_replay_while_recording_is_rejected() {
        let recorder = MacroRecorder::new();
        let mut source = ManualSource::new();
        recorder.start_recording(&mut source).unwrap();
        source.handle().unwrap().mouse_moved(0, 0);

        let (sink, _log) = CollectingSink::new();
        let err = recorder
            .start_replay(Box::new(sink), ReplayOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::SessionBusy { active: "Recording" }));
        assert_eq!(recorder.state(), SessionState::Recording);

        recorder.stop_recording().unwrap();
    }

    #[test]
    fn test_stop_replay_halts_remaining_events() {
        let recorder = recorder_with_tape(100, 4);
        let (sink, log) = CollectingSink::new();
        recorder
            .start_replay(Box::new(sink), ReplayOptions::default())
            .unwrap();

        thread::sleep(Duration::from_millis(130));
        recorder.stop_replay().unwrap();
        assert_eq!(recorder.state(), SessionState::Idle);

        thread::sleep(Duration::from_millis(300));
        let emitted = log.len();
        assert!(emitted >= 1, "expected at least the first event");
        assert!(emitted < 4, "cancellation must not emit the whole tape");
    }

    #[test]
    fn test_repetitions_return_to_idle_after_last_run() {
        let recorder = recorder_with_tape(10, 2);
        let (sink, log) = CollectingSink::new();
        let options = ReplayOptions::default()
            .with_repetitions(3)
            .with_pause_between_runs(0.02);

        recorder.start_replay(Box::new(sink), options).unwrap();
        assert_eq!(recorder.state(), SessionState::Replaying);
        assert!(wait_for_idle(&recorder, 2_000));
        assert_eq!(log.len(), 6);
    }

    #[test]
    fn test_replay_does_not_mutate_tape() {
        let recorder = recorder_with_tape(5, 2);
        let before = recorder.snapshot();

        let (sink, _log) = CollectingSink::new();
        recorder
            .start_replay(
                Box::new(sink),
                ReplayOptions::default()
                    .with_repetitions(2)
                    .with_pause_between_runs(0.01),
            )
            .unwrap();
        assert!(wait_for_idle(&recorder, 2_000));

        assert_eq!(recorder.snapshot(), before);
    }

    #[test]
    fn test_toggle_recording_labels() {
        let recorder = MacroRecorder::new();
        let mut source = ManualSource::new();

        let (active, label) = recorder.toggle_recording(&mut source).unwrap();
        assert!(active);
        assert_eq!(label, "Stop Recording");
        assert_eq!(recorder.state(), SessionState::Recording);

        let (active, label) = recorder.toggle_recording(&mut source).unwrap();
        assert!(!active);
        assert_eq!(label, "Start Recording");
        assert_eq!(recorder.state(), SessionState::Idle);
    }

    #[test]
    fn test_toggle_replay_labels() {
        let recorder = recorder_with_tape(100, 3);

        let (sink, _log) = CollectingSink::new();
        let (active, label) = recorder
            .toggle_replay(Box::new(sink), ReplayOptions::default())
            .unwrap();
        assert!(active);
        assert_eq!(label, "Stop Replay");

        let (sink, _log) = CollectingSink::new();
        let (active, label) = recorder
            .toggle_replay(Box::new(sink), ReplayOptions::default())
            .unwrap();
        assert!(!active);
        assert_eq!(label, "Start Replay");
        assert!(wait_for_idle(&recorder, 1_000));
    }

    #[test]
    fn test_observer_sees_every_transition() {
        let transitions: Arc<Mutex<Vec<(bool, &'static str)>>> =
            Arc::new(Mutex::new(Vec::new()));
        let sink_transitions = transitions.clone();

        let recorder = MacroRecorder::new();
        recorder.set_observer(move |active, label| {
            sink_transitions.lock().push((active, label));
        });

        let mut source = ManualSource::new();
        recorder.start_recording(&mut source).unwrap();
        source.handle().unwrap().mouse_moved(1, 2);
        recorder.stop_recording().unwrap();

        let (sink, _log) = CollectingSink::new();
        recorder
            .start_replay(Box::new(sink), ReplayOptions::default())
            .unwrap();
        assert!(wait_for_idle(&recorder, 1_000));

        let seen = transitions.lock().clone();
        assert_eq!(
            seen,
            vec![
                (true, "Recording"),
                (false, "Idle"),
                (true, "Replaying"),
                (false, "Idle"),
            ]
        );
    }

    #[test]
    fn test_save_and_load_during_session_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tape.json");

        let recorder = MacroRecorder::new();
        let mut source = ManualSource::new();
        recorder.start_recording(&mut source).unwrap();
        source.handle().unwrap().key(KeyId::Char('a'), true);

        assert!(matches!(
            recorder.save_to(&path),
            Err(Error::SessionBusy { .. })
        ));
        assert!(matches!(
            recorder.load_from(&path),
            Err(Error::SessionBusy { .. })
        ));
        assert_eq!(recorder.state(), SessionState::Recording);

        recorder.stop_recording().unwrap();
        recorder.save_to(&path).unwrap();
    }

    #[test]
    fn test_load_replaces_tape_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tape.json");

        let donor = recorder_with_tape(2, 3);
        donor.save_to(&path).unwrap();

        let recorder = MacroRecorder::new();
        let mut source = ManualSource::new();
        recorder.start_recording(&mut source).unwrap();
        let handle = source.handle().unwrap();
        handle.mouse_button(9, 9, MouseButton::Middle, true);
        recorder.stop_recording().unwrap();
        assert_eq!(recorder.sequence_len(), 1);

        recorder.load_from(&path).unwrap();
        assert_eq!(recorder.sequence_len(), 3);
        assert!(recorder
            .snapshot()
            .iter()
            .all(|e| matches!(e, TimedEvent::MouseMove { .. })));
    }

    #[test]
    fn test_load_failure_keeps_current_tape() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = recorder_with_tape(2, 2);

        let err = recorder.load_from(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(recorder.sequence_len(), 2);
        assert_eq!(recorder.state(), SessionState::Idle);
    }

    #[test]
    fn test_idle_stops_are_no_ops() {
        let recorder = MacroRecorder::new();
        recorder.stop_recording().unwrap();
        recorder.stop_replay().unwrap();
        assert_eq!(recorder.state(), SessionState::Idle);
    }

    #[test]
    fn test_stale_worker_cannot_clobber_new_session() {
        let recorder = recorder_with_tape(100, 3);

        let (sink, _log) = CollectingSink::new();
        recorder
            .start_replay(Box::new(sink), ReplayOptions::default())
            .unwrap();
        recorder.stop_replay().unwrap();

        // Start a fresh replay while the cancelled worker may still be
        // draining; its completion must not flip the new session to Idle.
        let (sink, _log) = CollectingSink::new();
        recorder
            .start_replay(Box::new(sink), ReplayOptions::default())
            .unwrap();
        assert_eq!(recorder.state(), SessionState::Replaying);

        thread::sleep(Duration::from_millis(50));
        assert_eq!(recorder.state(), SessionState::Replaying);

        assert!(wait_for_idle(&recorder, 2_000));
    }

    #[test]
    fn test_invalid_options_change_nothing() {
        let recorder = recorder_with_tape(2, 2);

        let (sink, log) = CollectingSink::new();
        let err = recorder
            .start_replay(Box::new(sink), ReplayOptions::default().with_speed(0.0))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSpeed(_)));
        assert_eq!(recorder.state(), SessionState::Idle);
        assert!(log.is_empty());
    }
}
