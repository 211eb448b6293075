//! Ordered event sink with isolated listener fan-out.

use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

use super::{Event, EventKind};
use crate::error::Result;

/// Consumer of emitted events.
///
/// A listener that fails or panics is logged and skipped; the other
/// listeners and the log are unaffected.
pub trait EventListener: Send {
    /// Name used in error logs
    fn name(&self) -> &str;

    /// Handle one event
    fn on_event(&mut self, event: &Event) -> Result<()>;
}

/// Stamps, records and forwards events.
#[derive(Default)]
pub struct EventEmitter {
    log: Vec<Event>,
    listeners: Vec<Box<dyn EventListener>>,
    last_ts: f64,
    emitted: u64,
}

impl EventEmitter {
    /// Emitter with no listeners
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; it sees only events emitted after this call.
    pub fn add_listener(&mut self, listener: Box<dyn EventListener>) {
        tracing::debug!("Registered event listener '{}'", listener.name());
        self.listeners.push(listener);
    }

    /// Builder form of [`EventEmitter::add_listener`]
    pub fn with_listener(mut self, listener: Box<dyn EventListener>) -> Self {
        self.add_listener(listener);
        self
    }

    /// Stamp an event, append it to the log and fan it out.
    pub fn emit(&mut self, kind: EventKind, data: Value) -> Event {
        let event = Event {
            event_type: kind.as_str().to_string(),
            ts: self.next_timestamp(),
            data,
        };
        self.log.push(event.clone());
        self.emitted += 1;

        for listener in &mut self.listeners {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener.on_event(&event)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!("Event listener '{}' failed: {}", listener.name(), e);
                }
                Err(_) => {
                    tracing::error!(
                        "Event listener '{}' panicked on {}",
                        listener.name(),
                        event.event_type
                    );
                }
            }
        }

        event
    }

    /// Full ordered log
    pub fn log(&self) -> &[Event] {
        &self.log
    }

    /// Hand over the log, leaving it empty (listeners stay registered)
    pub fn take_log(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.log)
    }

    /// Events emitted since construction, including any taken from the log
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Wall-clock seconds, clamped so the log never goes backwards
    fn next_timestamp(&mut self) -> f64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        self.last_ts = self.last_ts.max(now);
        self.last_ts
    }
}

/// Writes each event as one JSON line and flushes.
pub struct JsonLinesWriter<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonLinesWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the wrapped writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> EventListener for JsonLinesWriter<W> {
    fn name(&self) -> &str {
        "json_lines"
    }

    fn on_event(&mut self, event: &Event) -> Result<()> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
