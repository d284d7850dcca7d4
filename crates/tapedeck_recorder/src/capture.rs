//! Capture session: live input notifications to a timed tape.
//!
//! A capture session subscribes to an [`InputSource`], stamps each raw
//! notification with the monotonic clock, and appends it to the shared
//! tape. The source normalizes platform button/key payloads into the
//! closed enums of `tapedeck_core` at this boundary, so replay never sees
//! stringly-typed input.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use tapedeck_core::{clock, EventSequence, KeyId, MouseButton, Result, TimedEvent};

/// An active subscription to a live input source.
///
/// Returned by [`InputSource::subscribe`]; dropping or unsubscribing it
/// must detach every hook the source installed.
pub trait SourceSubscription: Send {
    fn unsubscribe(&mut self) -> Result<()>;
}

/// A live source of raw input notifications.
///
/// Implementations wrap an OS hook (or a test script) and forward pointer
/// moves, normalized button transitions, and normalized key transitions to
/// the provided [`CaptureHandle`] until unsubscribed.
pub trait InputSource {
    fn subscribe(&mut self, handle: CaptureHandle) -> Result<Box<dyn SourceSubscription>>;
}

/// Write end of a capture session, handed to the input source.
///
/// Cheap to clone; every notification is stamped with the monotonic clock
/// and appended to the shared tape while the session is active. After the
/// session stops, notifications are silently dropped, so a source that
/// races its own teardown cannot corrupt the tape.
#[derive(Clone)]
pub struct CaptureHandle {
    sequence: Arc<Mutex<EventSequence>>,
    active: Arc<AtomicBool>,
}

impl CaptureHandle {
    pub fn mouse_moved(&self, x: i32, y: i32) {
        self.append(|time| TimedEvent::MouseMove { time, x, y });
    }

    pub fn mouse_button(&self, x: i32, y: i32, button: MouseButton, pressed: bool) {
        self.append(|time| TimedEvent::MouseClick {
            time,
            x,
            y,
            button,
            pressed,
        });
    }

    pub fn key(&self, key: KeyId, pressed: bool) {
        self.append(|time| TimedEvent::Keyboard { time, key, pressed });
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn append(&self, make: impl FnOnce(f64) -> TimedEvent) {
        if !self.is_active() {
            return;
        }
        let event = make(clock::now());
        self.sequence.lock().push(event);
    }
}

/// An active recording session over one input source.
pub struct CaptureSession {
    active: Arc<AtomicBool>,
    subscription: Option<Box<dyn SourceSubscription>>,
}

impl CaptureSession {
    /// Clear the shared tape and begin capturing from `source`.
    pub fn start(
        source: &mut dyn InputSource,
        sequence: Arc<Mutex<EventSequence>>,
    ) -> Result<Self> {
        sequence.lock().clear();

        let active = Arc::new(AtomicBool::new(true));
        let handle = CaptureHandle {
            sequence,
            active: active.clone(),
        };
        let subscription = source.subscribe(handle)?;
        debug!("capture session started");

        Ok(Self {
            active,
            subscription: Some(subscription),
        })
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Stop capturing. Idempotent; already-captured events are retained.
    ///
    /// An unsubscribe failure is logged and swallowed so that stopping
    /// always succeeds from the caller's point of view.
    pub fn stop(&mut self) {
        self.active.store(false, Ordering::Release);
        if let Some(mut subscription) = self.subscription.take() {
            if let Err(err) = subscription.unsubscribe() {
                warn!(error = %err, "input source failed to unsubscribe");
            }
            debug!("capture session stopped");
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}
