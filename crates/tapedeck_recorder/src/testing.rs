//! Test doubles for sources and sinks.
//!
//! Used by this crate's own tests and by downstream crates that want to
//! exercise capture/replay without OS hooks: a manually driven input
//! source and a sink that records every emission with its real time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use tapedeck_core::{clock, Error, KeyId, MouseButton, Result};

use crate::capture::{CaptureHandle, InputSource, SourceSubscription};
use crate::sink::InputSink;

/// An input source driven by hand from test code.
///
/// `subscribe` publishes the [`CaptureHandle`] so the test can fire
/// notifications directly; unsubscribing withdraws it.
pub struct ManualSource {
    handle: Arc<Mutex<Option<CaptureHandle>>>,
    unsubscribed: Arc<AtomicBool>,
    fail_unsubscribe: bool,
}

impl ManualSource {
    pub fn new() -> Self {
        Self {
            handle: Arc::new(Mutex::new(None)),
            unsubscribed: Arc::new(AtomicBool::new(false)),
            fail_unsubscribe: false,
        }
    }

    /// Make `unsubscribe` report a failure, exercising teardown tolerance.
    pub fn with_failing_unsubscribe(mut self) -> Self {
        self.fail_unsubscribe = true;
        self
    }

    /// The capture handle of the current subscription, if any.
    pub fn handle(&self) -> Option<CaptureHandle> {
        self.handle.lock().clone()
    }

    pub fn is_unsubscribed(&self) -> bool {
        self.unsubscribed.load(Ordering::Acquire)
    }
}

impl Default for ManualSource {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for ManualSource {
    fn subscribe(&mut self, handle: CaptureHandle) -> Result<Box<dyn SourceSubscription>> {
        self.unsubscribed.store(false, Ordering::Release);
        *self.handle.lock() = Some(handle);
        Ok(Box::new(ManualSubscription {
            unsubscribed: self.unsubscribed.clone(),
            fail: self.fail_unsubscribe,
        }))
    }
}

struct ManualSubscription {
    unsubscribed: Arc<AtomicBool>,
    fail: bool,
}

impl SourceSubscription for ManualSubscription {
    fn unsubscribe(&mut self) -> Result<()> {
        self.unsubscribed.store(true, Ordering::Release);
        if self.fail {
            return Err(Error::Source("simulated unsubscribe failure".into()));
        }
        Ok(())
    }
}

/// One emission observed by a [`CollectingSink`].
#[derive(Clone, Debug, PartialEq)]
pub enum Emission {
    MouseMove { x: i32, y: i32 },
    MouseButton { button: MouseButton, pressed: bool },
    Key { key: KeyId, pressed: bool },
}

/// Shared view of the emissions a [`CollectingSink`] has recorded.
#[derive(Clone, Default)]
pub struct EmissionLog {
    entries: Arc<Mutex<Vec<(f64, Emission)>>>,
}

impl EmissionLog {
    /// Copy of all recorded `(monotonic seconds, emission)` pairs.
    pub fn snapshot(&self) -> Vec<(f64, Emission)> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn record(&self, emission: Emission) {
        self.entries.lock().push((clock::now(), emission));
    }
}

/// A sink that records emissions with their real arrival time.
pub struct CollectingSink {
    log: EmissionLog,
    fail_keys: bool,
}

impl CollectingSink {
    pub fn new() -> (Self, EmissionLog) {
        let log = EmissionLog::default();
        (
            Self {
                log: log.clone(),
                fail_keys: false,
            },
            log,
        )
    }

    /// Make every `key` emission fail, exercising partial degradation.
    pub fn fail_keys(&mut self) {
        self.fail_keys = true;
    }
}

impl InputSink for CollectingSink {
    fn mouse_move(&mut self, x: i32, y: i32) -> Result<()> {
        self.log.record(Emission::MouseMove { x, y });
        Ok(())
    }

    fn mouse_button(&mut self, button: MouseButton, pressed: bool) -> Result<()> {
        self.log.record(Emission::MouseButton { button, pressed });
        Ok(())
    }

    fn key(&mut self, key: &KeyId, pressed: bool) -> Result<()> {
        if self.fail_keys {
            return Err(Error::Injection(format!("simulated failure for {key}")));
        }
        self.log.record(Emission::Key {
            key: *key,
            pressed,
        });
        Ok(())
    }
}
