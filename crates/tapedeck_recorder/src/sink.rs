//! Output sinks for replayed events.

use tracing::info;

use tapedeck_core::{KeyId, MouseButton, Result};

/// A simulated input controller that replay drives.
///
/// Implementations inject pointer and key actions into the host system (or
/// record them, for tests and dry runs). Each method may fail for a single
/// emission; replay logs the failure and continues with the next event.
pub trait InputSink: Send {
    /// Move the simulated pointer to an absolute position.
    fn mouse_move(&mut self, x: i32, y: i32) -> Result<()>;

    /// Press or release a pointer button at the current position.
    fn mouse_button(&mut self, button: MouseButton, pressed: bool) -> Result<()>;

    /// Press or release a key.
    fn key(&mut self, key: &KeyId, pressed: bool) -> Result<()>;
}

/// A sink that logs each emission instead of injecting input.
///
/// Used by the CLI for dry-run playback and useful when wiring up a new
/// platform backend.
pub struct TraceSink;

impl InputSink for TraceSink {
    fn mouse_move(&mut self, x: i32, y: i32) -> Result<()> {
        info!(x, y, "mouse move");
        Ok(())
    }

    fn mouse_button(&mut self, button: MouseButton, pressed: bool) -> Result<()> {
        info!(button = %button, pressed, "mouse button");
        Ok(())
    }

    fn key(&mut self, key: &KeyId, pressed: bool) -> Result<()> {
        info!(key = %key, pressed, "key");
        Ok(())
    }
}
