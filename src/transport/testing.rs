//! Scripted in-memory transport for exercising the read loop and the
//! session state machine without a server.

use std::collections::VecDeque;
use std::time::Duration;

use super::{Transport, TryRead};
use crate::error::TransportError;

/// Scripted transport.
///
/// Chunks in `current` are available to `try_read` immediately; each
/// `wait_ready` call releases the next entry of `ticks`. Responses queued
/// with [`respond_to_line_break`](Self::respond_to_line_break) are released
/// as a new tick when a line break is written, which models a shell that
/// only produces output once the execution trigger arrives.
pub(crate) struct MockTransport {
    current: VecDeque<Vec<u8>>,
    ticks: VecDeque<Vec<Vec<u8>>>,
    on_line_break: VecDeque<Vec<Vec<u8>>>,
    eof_when_exhausted: bool,
    pub sent: Vec<u8>,
}

impl MockTransport {
    pub fn new(first_tick: Vec<Vec<u8>>, ticks: Vec<Vec<Vec<u8>>>) -> Self {
        Self {
            current: first_tick.into(),
            ticks: ticks.into(),
            on_line_break: VecDeque::new(),
            eof_when_exhausted: false,
            sent: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![], vec![])
    }

    /// Report end-of-stream once every scripted chunk has been consumed.
    pub fn with_eof(mut self) -> Self {
        self.eof_when_exhausted = true;
        self
    }

    /// Queue chunks to be released after the next unmatched line-break
    /// write, one chunk per tick.
    pub fn respond_to_line_break(mut self, chunks: Vec<Vec<u8>>) -> Self {
        self.on_line_break.push_back(chunks);
        self
    }

    pub fn sent_text(&self) -> String {
        String::from_utf8_lossy(&self.sent).to_string()
    }
}

impl Transport for MockTransport {
    fn try_read(&mut self, buf: &mut [u8]) -> Result<TryRead, TransportError> {
        match self.current.pop_front() {
            Some(chunk) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                // A chunk larger than the caller's buffer is handed out
                // across successive reads, like a real channel queue.
                if n < chunk.len() {
                    self.current.push_front(chunk[n..].to_vec());
                }
                Ok(TryRead::Data(n))
            }
            None if self.ticks.is_empty()
                && self.on_line_break.is_empty()
                && self.eof_when_exhausted =>
            {
                Ok(TryRead::Eof)
            }
            None => Ok(TryRead::WouldBlock),
        }
    }

    async fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.sent.extend_from_slice(data);
        if data.contains(&b'\n') {
            if let Some(response) = self.on_line_break.pop_front() {
                self.ticks.extend(response.into_iter().map(|chunk| vec![chunk]));
            }
        }
        Ok(())
    }

    async fn wait_ready(&mut self, _tick: Duration) -> Result<(), TransportError> {
        if self.current.is_empty() {
            if let Some(tick) = self.ticks.pop_front() {
                self.current = tick.into();
            }
        }
        Ok(())
    }

    async fn close(self) -> Result<(), TransportError> {
        Ok(())
    }
}
