//! Tape persistence.
//!
//! Tapes are stored as a pretty-printed JSON array of flat records, one per
//! event. Timestamps are monotonic-clock-relative seconds, so absolute
//! values from different runs are not comparable; only relative deltas
//! within one tape matter, and save-then-load preserves those exactly.
//!
//! Loading is lenient per record: a record whose button or key cannot be
//! interpreted is skipped with a warning rather than failing the whole
//! load. A structurally invalid file is an error.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::event::{KeyId, MouseButton, TimedEvent};
use crate::sequence::EventSequence;

const KIND_MOUSE_MOVE: &str = "mouse_move";
const KIND_MOUSE_CLICK: &str = "mouse_click";
const KIND_KEYBOARD: &str = "keyboard";

/// Flat on-disk form of one event.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl From<&TimedEvent> for EventRecord {
    fn from(event: &TimedEvent) -> Self {
        match *event {
            TimedEvent::MouseMove { time, x, y } => EventRecord {
                kind: KIND_MOUSE_MOVE.to_string(),
                time,
                x: Some(x),
                y: Some(y),
                button: None,
                pressed: None,
                key: None,
            },
            TimedEvent::MouseClick {
                time,
                x,
                y,
                button,
                pressed,
            } => EventRecord {
                kind: KIND_MOUSE_CLICK.to_string(),
                time,
                x: Some(x),
                y: Some(y),
                button: Some(button.as_str().to_string()),
                pressed: Some(pressed),
                key: None,
            },
            TimedEvent::Keyboard { time, key, pressed } => EventRecord {
                kind: KIND_KEYBOARD.to_string(),
                time,
                x: None,
                y: None,
                button: None,
                pressed: Some(pressed),
                key: Some(key.to_string()),
            },
        }
    }
}

impl EventRecord {
    /// Convert back to a typed event, or `None` when the record cannot be
    /// interpreted.
    pub fn decode(&self) -> Option<TimedEvent> {
        match self.kind.as_str() {
            KIND_MOUSE_MOVE => Some(TimedEvent::MouseMove {
                time: self.time,
                x: self.x?,
                y: self.y?,
            }),
            KIND_MOUSE_CLICK => Some(TimedEvent::MouseClick {
                time: self.time,
                x: self.x?,
                y: self.y?,
                button: MouseButton::parse(self.button.as_deref()?),
                pressed: self.pressed?,
            }),
            KIND_KEYBOARD => Some(TimedEvent::Keyboard {
                time: self.time,
                key: KeyId::parse(self.key.as_deref()?)?,
                pressed: self.pressed?,
            }),
            _ => None,
        }
    }
}

/// Write a tape to `path` as pretty-printed JSON.
pub fn save<P: AsRef<Path>>(path: P, sequence: &EventSequence) -> Result<()> {
    let records: Vec<EventRecord> = sequence.iter().map(EventRecord::from).collect();
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &records)?;
    writer.flush()?;
    info!(path = %path.as_ref().display(), events = records.len(), "tape saved");
    Ok(())
}

/// Read a tape from `path`, skipping records that cannot be interpreted.
pub fn load<P: AsRef<Path>>(path: P) -> Result<EventSequence> {
    let file = File::open(path.as_ref())?;
    let records: Vec<EventRecord> = serde_json::from_reader(BufReader::new(file))?;

    let mut sequence = EventSequence::new();
    let mut skipped = 0usize;
    for record in &records {
        match record.decode() {
            Some(event) => sequence.push(event),
            None => {
                skipped += 1;
                warn!(kind = %record.kind, "skipping unrecognized tape record");
            }
        }
    }
    if skipped > 0 {
        warn!(skipped, "tape contained records that could not be interpreted");
    }
    info!(path = %path.as_ref().display(), events = sequence.len(), "tape loaded");
    Ok(sequence)
}
