//! Output sinks for streamed command output.
//!
//! The read loop forwards each increment, in the order the bytes came off
//! the transport, to a single sink. A sink shared across sessions must
//! handle its own synchronization; the engine performs none.

use std::io::{self, Write};

use log::trace;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::error::SinkError;

/// Receives ordered output increments for one session.
pub trait OutputSink: Send {
    /// Deliver one increment. Called as soon as the increment is produced;
    /// no batching.
    fn publish(&mut self, increment: &str) -> Result<(), SinkError>;
}

/// Sink that writes increments straight to stdout.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

impl OutputSink for ConsoleSink {
    fn publish(&mut self, increment: &str) -> Result<(), SinkError> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(increment.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

/// Wire record for bus delivery: a single-field JSON object whose payload
/// is the increment's trimmed text.
#[derive(Debug, Serialize)]
struct BusRecord<'a> {
    contents: &'a str,
}

/// Sink that publishes each increment as a JSON record onto a channel.
///
/// The concrete bus technology lives behind the receiver half; this side
/// only serializes and sends.
#[derive(Debug)]
pub struct BusSink {
    publisher: UnboundedSender<String>,
}

impl BusSink {
    pub fn new(publisher: UnboundedSender<String>) -> Self {
        Self { publisher }
    }
}

impl OutputSink for BusSink {
    fn publish(&mut self, increment: &str) -> Result<(), SinkError> {
        let record = BusRecord {
            contents: increment.trim(),
        };
        let json = serde_json::to_string(&record)?;
        trace!("publishing record: {json}");
        self.publisher
            .send(json)
            .map_err(|_| SinkError::BusClosed)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Test sink that records every increment it receives.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingSink {
        pub increments: Vec<String>,
    }

    impl OutputSink for RecordingSink {
        fn publish(&mut self, increment: &str) -> Result<(), SinkError> {
            self.increments.push(increment.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_recording_sink_preserves_order() {
        let mut sink = RecordingSink::default();
        sink.publish("one").unwrap();
        sink.publish("two").unwrap();
        sink.publish("three").unwrap();
        assert_eq!(sink.increments, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_bus_record_shape() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut sink = BusSink::new(tx);
        sink.publish("  hi there\n").unwrap();
        let json = rx.try_recv().unwrap();
        assert_eq!(json, r#"{"contents":"hi there"}"#);
    }

    #[test]
    fn test_bus_record_escapes_control_characters() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut sink = BusSink::new(tx);
        sink.publish("a\tb\"c").unwrap();
        assert_eq!(rx.try_recv().unwrap(), r#"{"contents":"a\tb\"c"}"#);
    }

    #[test]
    fn test_bus_sink_closed_receiver() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<String>();
        drop(rx);
        let mut sink = BusSink::new(tx);
        assert!(matches!(sink.publish("x"), Err(SinkError::BusClosed)));
    }
}
