use std::collections::BTreeMap;

use tokio::sync::mpsc;

use crate::event::Event;

/// Receiver of decoder events.
///
/// Calls happen synchronously between reads of the upstream body and are
/// never reentrant.
pub trait EventSink: Send {
    fn on_event(&mut self, event: Event);
}

impl<F> EventSink for F
where
    F: FnMut(Event) + Send,
{
    fn on_event(&mut self, event: Event) {
        self(event)
    }
}

/// Forwards events to a channel. Once the receiver is gone the owning task
/// is cancelled, so events sent in the meantime are dropped.
impl EventSink for mpsc::UnboundedSender<Event> {
    fn on_event(&mut self, event: Event) {
        let _ = self.send(event);
    }
}

/// Sink that retains every event, in order, for later inspection.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    /// Last-write-wins view of every file seen so far.
    pub fn latest_files(&self) -> BTreeMap<String, String> {
        let mut files = BTreeMap::new();
        for event in &self.events {
            if let Event::File { name, content } = event {
                files.insert(name.clone(), content.clone());
            }
        }
        files
    }

    /// Message of the first error event, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.events.iter().find_map(|event| match event {
            Event::Error { message } => Some(message.as_str()),
            _ => None,
        })
    }
}

impl EventSink for EventLog {
    fn on_event(&mut self, event: Event) {
        self.events.push(event);
    }
}
