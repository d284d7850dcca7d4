//! Ordered tape of timed events.

use crate::event::TimedEvent;

/// An ordered sequence of [`TimedEvent`]s, insertion order = temporal order.
///
/// Capture appends events as they occur, so timestamps are non-decreasing
/// across the sequence. An empty sequence is valid but not replayable.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventSequence {
    events: Vec<TimedEvent>,
}

impl EventSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: Vec<TimedEvent>) -> Self {
        Self { events }
    }

    /// Append an event. The caller stamps events in capture order.
    pub fn push(&mut self, event: TimedEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimedEvent> {
        self.events.iter()
    }

    pub fn as_slice(&self) -> &[TimedEvent] {
        &self.events
    }

    /// Timestamp of the first event, the replay base offset.
    pub fn first_time(&self) -> Option<f64> {
        self.events.first().map(TimedEvent::time)
    }

    /// Span in seconds between the first and last event.
    pub fn duration(&self) -> f64 {
        match (self.events.first(), self.events.last()) {
            (Some(first), Some(last)) => last.time() - first.time(),
            _ => 0.0,
        }
    }
}

impl<'a> IntoIterator for &'a EventSequence {
    type Item = &'a TimedEvent;
    type IntoIter = std::slice::Iter<'a, TimedEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
